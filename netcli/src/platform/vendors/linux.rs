//! Linux family.
//!
//! This is the simplest family: standard Linux/Unix shells with `$` (user)
//! and `#` (root) prompts and no handshake.

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet};

/// Family name for Linux.
pub const FAMILY_NAME: &str = "linux";

/// Create the Linux family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(FAMILY_NAME, r"(?m)^[^\r\n]*[$#][ \t]*$")?
        .with_comment_marker("#")
        .with_config_dump_command("ip address show");

    let errors = ErrorSignatureSet::new([
        "command not found",
        "No such file or directory",
        "Permission denied",
        "Operation not permitted",
    ])?;

    Ok(DeviceFamily::new(dialect).with_error_patterns(errors))
}
