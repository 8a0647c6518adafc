//! Casa Systems CMTS (cable modem termination system) family.
//!
//! # Prompt Examples
//!
//! ```text
//! CASA-C100G>               # user mode, unsupported after the handshake
//! CASA-C100G#               # privileged mode
//! CASA-C100G(config)#       # configuration mode
//! ```

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet, HandshakeScript};

/// Family name for Casa CMTS.
pub const FAMILY_NAME: &str = "casa_cmts";

/// Create the Casa CMTS family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(FAMILY_NAME, r"(?m)^[\w.\-]{1,63}(\([\w\-/ ]{1,32}\))?[>#]\s?$")?
        .with_unsupported_prompt(r">\s*$")?
        .with_pagination(r" *--More-- *", " ")?
        .with_sections(r"(?m)^!$")?
        .with_comment_marker("!")
        .with_end_marker("end")
        .with_config_dump_command("show running-config");

    let errors = ErrorSignatureSet::new([
        r"(?i)% ?invalid (command|input)",
        r"(?i)% ?unknown command",
        r"(?i)% ?incomplete command",
        r"(?m)^(?i)error:",
    ])?;

    let handshake = HandshakeScript::new()
        .with_elevation("enable", Some(r"(?i)password:\s*$"))?
        .with_normalize("page-off");

    Ok(DeviceFamily::new(dialect)
        .with_error_patterns(errors)
        .with_initializer(handshake))
}
