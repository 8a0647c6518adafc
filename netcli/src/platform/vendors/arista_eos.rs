//! Arista EOS family.
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! switch>                            # exec, unsupported after the handshake
//! switch#                            # privileged exec
//! switch(config-if-Et1)#             # config sub-mode
//! ```

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet, HandshakeScript};

/// Family name for Arista EOS.
pub const FAMILY_NAME: &str = "arista_eos";

/// Create the Arista EOS family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(
        FAMILY_NAME,
        r"(?mi)^[\w.\-@()/: ]{1,63}(\(config[\w.\-@/:+]{0,63}\))?[>#]\s?$",
    )?
    .with_unsupported_prompt(r">\s*$")?
    .with_pagination(r" *--More-- *", " ")?
    .with_sections(r"(?m)^!$")?
    .with_comment_marker("!")
    .with_end_marker("end")
    .with_config_dump_command("show running-config");

    let errors = ErrorSignatureSet::new([
        r"% Ambiguous command",
        r"% Error",
        r"% Incomplete command",
        r"% Invalid input",
        r"% Cannot commit",
        r"% Unavailable command",
        r"% Duplicate sequence number",
    ])?;

    let handshake = HandshakeScript::new()
        .with_elevation("enable", Some(r"(?mi)^password:\s?$"))?
        .with_normalize("terminal length 0")
        .with_normalize("terminal width 32767");

    Ok(DeviceFamily::new(dialect)
        .with_error_patterns(errors)
        .with_initializer(handshake))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::classify;

    #[test]
    fn test_arista_family() {
        let family = family().unwrap();
        assert_eq!(family.name, "arista_eos");
        assert_eq!(family.error_patterns.len(), 7);
    }

    #[test]
    fn test_prompt_match() {
        let family = family().unwrap();
        let dialect = &family.dialect;

        assert!(dialect.is_prompt("switch#"));
        assert!(dialect.is_prompt("admin@switch#"));
        assert!(dialect.is_prompt("switch(config)#"));
        assert!(dialect.is_prompt("switch(config-if-Et1)# "));
        assert!(dialect.is_unsupported_prompt("switch>"));
        assert!(!dialect.is_unsupported_prompt("switch#"));
    }

    #[test]
    fn test_error_patterns() {
        let family = family().unwrap();
        assert!(classify("% Invalid input (at token 1: 'foo')", &family.error_patterns).is_some());
        assert!(classify("% Cannot commit session", &family.error_patterns).is_some());
        assert!(classify("Arista vEOS", &family.error_patterns).is_none());
    }
}
