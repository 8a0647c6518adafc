//! Built-in device families.

pub mod arista_eos;
pub mod casa_cmts;
pub mod cisco_ios;
pub mod juniper_junos;
pub mod linux;
pub mod nokia_sros;

use crate::error::PlatformError;
use crate::platform::DeviceFamily;

/// All built-in families, in registration order.
pub fn builtin() -> Vec<Result<DeviceFamily, PlatformError>> {
    vec![
        cisco_ios::family(),
        arista_eos::family(),
        juniper_junos::family(),
        nokia_sros::family(),
        casa_cmts::family(),
        linux::family(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_families_compile() {
        for family in builtin() {
            let family = family.unwrap();
            assert_eq!(family.name, family.dialect.name);
        }
    }
}
