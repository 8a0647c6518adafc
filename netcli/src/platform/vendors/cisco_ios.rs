//! Cisco IOS / IOS-XE family.
//!
//! # Prompt Examples
//!
//! ```text
//! router>                 # user EXEC, unsupported after the handshake
//! router#                 # privileged EXEC
//! router(config-if)#      # configuration sub-mode
//! ```
//!
//! # Handshake
//!
//! `enable` (answering `Password:` with the enable secret), then
//! `terminal length 0` and `terminal width 0`.

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet, HandshakeScript};

/// Family name for Cisco IOS.
pub const FAMILY_NAME: &str = "cisco_ios";

/// Create the Cisco IOS family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(
        FAMILY_NAME,
        r"(?m)^[\w.\-@/:]{1,63}(\([\w.\-@/:+]{0,32}\))?[>#]\s?$",
    )?
    .with_unsupported_prompt(r">\s*$")?
    .with_pagination(r" *--More-- *", " ")?
    .with_sections(r"(?m)^!$")?
    .with_comment_marker("!")
    .with_end_marker("end")
    .with_config_dump_command("show running-config");

    let errors = ErrorSignatureSet::new([
        r"% (?i)invalid input",
        r"% (?i)unknown command",
        r"% (?i)incomplete command",
        r"% (?i)ambiguous command",
        r"(?m)^% ?(?i)error",
    ])?;

    let handshake = HandshakeScript::new()
        .with_elevation("enable", Some(r"(?i)password:\s*$"))?
        .with_normalize("terminal length 0")
        .with_normalize("terminal width 0");

    Ok(DeviceFamily::new(dialect)
        .with_error_patterns(errors)
        .with_initializer(handshake))
}
