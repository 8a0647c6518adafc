//! Device dialect: everything the engine needs to know about how one vendor
//! family talks, independent of any particular session.

use std::fmt;

use regex::Regex;
use regex::bytes::Regex as BytesRegex;

use crate::channel::patterns::{compile_bytes, compile_prompt_pattern, compile_text};
use crate::error::PlatformError;

/// Line terminator a device expects after each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
    Cr,
}

impl Newline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
            Newline::Cr => "\r",
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

/// How a configuration dump from this family is post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Treat the dump as one block of lines.
    #[default]
    Flat,
    /// Split the dump into sections on the dialect's section pattern.
    Sections,
}

/// A cleaned configuration dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDump {
    /// Dump text with comment and end-marker lines removed.
    pub text: String,

    /// Non-empty sections, in device order. A flat dump is one section.
    pub sections: Vec<String>,
}

/// Immutable per-family descriptor, shared by every session of the family.
#[derive(Clone)]
pub struct Dialect {
    /// Family name (e.g. "cisco_ios").
    pub name: String,

    /// Pattern matching the prompt the device sits on when ready.
    pub prompt: BytesRegex,

    /// Prompt pattern that means the session is still in a restricted or
    /// otherwise unsupported shell after the handshake.
    pub unsupported_prompt: Option<Regex>,

    /// Marker printed when output is paged.
    pub pagination: Option<BytesRegex>,

    /// Keystroke sent to advance a page.
    pub pagination_keystroke: String,

    /// Pattern separating sections of a configuration dump.
    pub section_split: Option<Regex>,

    /// Separator between the fields of a configuration line.
    pub field_separator: String,

    /// Output post-processing mode for configuration dumps.
    pub output_mode: OutputMode,

    /// Prefix of commented-out lines in a configuration dump.
    pub comment_marker: Option<String>,

    /// Lines that terminate paged output or a full configuration dump.
    pub end_markers: Vec<String>,

    /// Line terminator for commands.
    pub newline: Newline,

    /// Command that dumps the full configuration.
    pub config_dump_command: String,
}

impl Dialect {
    /// Create a dialect with a prompt pattern and defaults for everything else.
    pub fn new(name: impl Into<String>, prompt: &str) -> Result<Self, PlatformError> {
        Ok(Self {
            name: name.into(),
            prompt: compile_prompt_pattern(prompt)?,
            unsupported_prompt: None,
            pagination: None,
            pagination_keystroke: " ".to_string(),
            section_split: None,
            field_separator: " ".to_string(),
            output_mode: OutputMode::Flat,
            comment_marker: None,
            end_markers: vec![],
            newline: Newline::Lf,
            config_dump_command: "show running-config".to_string(),
        })
    }

    /// Set the unsupported (restricted shell) prompt pattern.
    pub fn with_unsupported_prompt(mut self, pattern: &str) -> Result<Self, PlatformError> {
        self.unsupported_prompt = Some(compile_text(pattern)?);
        Ok(self)
    }

    /// Set the pagination marker and the keystroke that advances it.
    pub fn with_pagination(
        mut self,
        marker: &str,
        keystroke: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        self.pagination = Some(compile_bytes(marker)?);
        self.pagination_keystroke = keystroke.into();
        Ok(self)
    }

    /// Split configuration dumps into sections on `pattern`.
    pub fn with_sections(mut self, pattern: &str) -> Result<Self, PlatformError> {
        self.section_split = Some(compile_text(pattern)?);
        self.output_mode = OutputMode::Sections;
        Ok(self)
    }

    pub fn with_field_separator(mut self, separator: impl Into<String>) -> Self {
        self.field_separator = separator.into();
        self
    }

    pub fn with_comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = Some(marker.into());
        self
    }

    pub fn with_end_marker(mut self, marker: impl Into<String>) -> Self {
        self.end_markers.push(marker.into());
        self
    }

    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    pub fn with_config_dump_command(mut self, command: impl Into<String>) -> Self {
        self.config_dump_command = command.into();
        self
    }

    /// Whether `prompt` shows the device is still in an unsupported shell.
    pub fn is_unsupported_prompt(&self, prompt: &str) -> bool {
        self.unsupported_prompt
            .as_ref()
            .is_some_and(|re| re.is_match(prompt))
    }

    /// Whether `text` ends in this dialect's prompt.
    pub fn is_prompt(&self, text: &str) -> bool {
        self.prompt.is_match(text.as_bytes())
    }

    /// Split one configuration line into fields.
    pub fn split_fields<'a>(&self, line: &'a str) -> Vec<&'a str> {
        line.split(self.field_separator.as_str())
            .filter(|f| !f.is_empty())
            .collect()
    }

    fn is_noise_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if self.end_markers.iter().any(|m| m == trimmed) {
            return true;
        }
        match &self.comment_marker {
            // A bare marker is a section separator, keep it for splitting.
            Some(marker) => trimmed.starts_with(marker.as_str()) && trimmed != marker,
            None => false,
        }
    }

    /// Remove comments and end markers from a configuration dump and split it
    /// according to the output mode.
    pub fn clean_config(&self, dump: &str) -> ConfigDump {
        let kept: Vec<&str> = dump.lines().filter(|l| !self.is_noise_line(l)).collect();
        let joined = kept.join("\n");

        let sections = match (&self.output_mode, &self.section_split) {
            (OutputMode::Sections, Some(split)) => split
                .split(&joined)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ if joined.trim().is_empty() => vec![],
            _ => vec![joined.trim().to_string()],
        };

        let text = match &self.comment_marker {
            Some(marker) => kept
                .iter()
                .filter(|l| l.trim() != marker)
                .copied()
                .collect::<Vec<_>>()
                .join("\n"),
            None => joined,
        };

        ConfigDump {
            text: text.trim().to_string(),
            sections,
        }
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("prompt", &self.prompt.as_str())
            .field(
                "unsupported_prompt",
                &self.unsupported_prompt.as_ref().map(Regex::as_str),
            )
            .field("pagination", &self.pagination.as_ref().map(BytesRegex::as_str))
            .field("output_mode", &self.output_mode)
            .field("newline", &self.newline)
            .field("config_dump_command", &self.config_dump_command)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios_like() -> Dialect {
        Dialect::new("test", r"(?m)^[\w.\-]{1,63}[>#]\s?$")
            .unwrap()
            .with_unsupported_prompt(r">\s*$")
            .unwrap()
            .with_sections(r"(?m)^!$")
            .unwrap()
            .with_comment_marker("!")
            .with_end_marker("end")
    }

    #[test]
    fn test_newline_bytes() {
        assert_eq!(Newline::Lf.as_bytes(), b"\n");
        assert_eq!(Newline::CrLf.as_str(), "\r\n");
        assert_eq!(Newline::default(), Newline::Lf);
    }

    #[test]
    fn test_prompt_and_unsupported() {
        let dialect = ios_like();
        assert!(dialect.is_prompt("output\nrouter#"));
        assert!(dialect.is_prompt("router> "));
        assert!(!dialect.is_prompt("router# show version"));
        assert!(dialect.is_unsupported_prompt("router>"));
        assert!(!dialect.is_unsupported_prompt("router#"));
    }

    #[test]
    fn test_clean_config_sections() {
        let dialect = ios_like();
        let dump = "Building configuration...\n! Last change: today\nhostname r1\n!\ninterface Gi0/1\n description up\n!\nend";
        let cleaned = dialect.clean_config(dump);

        assert_eq!(
            cleaned.sections,
            vec![
                "Building configuration...\nhostname r1".to_string(),
                "interface Gi0/1\n description up".to_string(),
            ]
        );
        assert!(!cleaned.text.contains("Last change"));
        assert!(!cleaned.text.contains("end"));
        assert!(!cleaned.text.lines().any(|l| l.trim() == "!"));
    }

    #[test]
    fn test_clean_config_flat() {
        let dialect = Dialect::new("flat", r"[>#]").unwrap().with_comment_marker("#");
        let cleaned = dialect.clean_config("# generated\nset system host-name r1\n");
        assert_eq!(cleaned.sections, vec!["set system host-name r1".to_string()]);
        assert_eq!(cleaned.text, "set system host-name r1");
    }

    #[test]
    fn test_split_fields() {
        let dialect = ios_like();
        assert_eq!(
            dialect.split_fields("ip address  10.0.0.1 255.255.255.0"),
            vec!["ip", "address", "10.0.0.1", "255.255.255.0"]
        );
    }
}
