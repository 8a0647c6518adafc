//! Juniper JUNOS family.
//!
//! Logging in as root lands in the FreeBSD shell (`%`), so the handshake
//! enters the CLI with `cli` before the prompt is checked. A session still
//! sitting on a `%` prompt afterwards is unsupported.
//!
//! # Prompt Examples
//!
//! ```text
//! root@router%              # unix shell, unsupported
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # operational mode
//! {master:0}[edit]          # configuration mode banner
//! user@router#              # configuration mode
//! ```

use crate::error::PlatformError;
use crate::platform::{Dialect, DeviceFamily, ErrorSignatureSet, HandshakeScript, VendorBehavior};

/// Family name for Juniper JUNOS.
pub const FAMILY_NAME: &str = "juniper_junos";

/// Create the Juniper JUNOS family.
pub fn family() -> Result<DeviceFamily, PlatformError> {
    let dialect = Dialect::new(FAMILY_NAME, r"(?m)^[\w\-@()/:.]{1,63}[>#]\s?$")?
        .with_unsupported_prompt(r"%\s*$")?
        .with_pagination(r"---\(more[^)]*\)---", " ")?
        .with_comment_marker("#")
        .with_config_dump_command("show configuration | display set");

    let errors = ErrorSignatureSet::new([
        r"(?i)unknown command",
        r"(?i)syntax error",
        r"(?i)error:",
        r"(?i)missing argument",
        r"(?i)is ambiguous",
        r"(?i)no valid completions",
        r"(?i)invalid numeric value",
    ])?;

    let handshake = HandshakeScript::new().with_shell("cli", None)?;

    Ok(DeviceFamily::new(dialect)
        .with_error_patterns(errors)
        .with_initializer(handshake)
        .with_behavior(JuniperBehavior))
}

/// Juniper JUNOS-specific behavior.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn post_process_output(&self, output: &str) -> String {
        // Routing-engine and [edit] banners are prompt decoration, not output.
        output
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !(trimmed.starts_with("[edit") || is_re_banner(trimmed))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `{master:0}`, `{backup}`, `{master:0}[edit]` and friends.
fn is_re_banner(line: &str) -> bool {
    line.starts_with('{') && (line.ends_with('}') || line.ends_with(']'))
}
