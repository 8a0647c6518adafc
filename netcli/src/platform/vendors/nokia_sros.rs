//! Nokia SR OS family.
//!
//! Covers both the classic CLI and MD-CLI: the engine only needs the line the
//! device sits on, which looks the same in both.
//!
//! # Prompt Examples
//!
//! ```text
//! A:router#                            # classic exec
//! *A:router>config#                    # classic config, unsaved changes
//! [/]                                  # MD-CLI context (line 1)
//! A:admin@router#                      # MD-CLI (line 2)
//! ```
//!
//! Prompt patterns adapted from
//! [scrapli](https://github.com/scrapli/scrapli_community/blob/main/scrapli_community/nokia/sros/nokia_sros.py).

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet, HandshakeScript};

/// Family name for Nokia SR OS.
pub const FAMILY_NAME: &str = "nokia_sros";

/// Create the Nokia SR OS family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(FAMILY_NAME, r"(?m)^\*?[ABCD]:[\w.\-@]{1,63}(>[\w\-]+)*[#$]\s?$")?
        .with_pagination(r"Press any key to continue \(Q to quit\)", " ")?
        .with_comment_marker("#")
        .with_end_marker("exit all")
        .with_config_dump_command("admin display-config");

    let errors = ErrorSignatureSet::new([
        r"(?m)^MINOR:",
        r"(?m)^MAJOR:",
        r"(?m)^CRITICAL:",
        r"(?m)^Error:",
    ])?;

    let handshake = HandshakeScript::new().with_normalize("environment no more");

    Ok(DeviceFamily::new(dialect)
        .with_error_patterns(errors)
        .with_initializer(handshake))
}
