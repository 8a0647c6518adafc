//! Commands submitted to a session.

use std::fmt;

/// What a command does to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Read-only (show, display).
    Read,
    /// Creates or updates configuration.
    Write,
    /// Removes configuration.
    Delete,
}

impl CommandKind {
    /// Write and delete change device state.
    pub fn is_destructive(self) -> bool {
        !matches!(self, CommandKind::Read)
    }
}

/// One command line and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub text: String,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn read(text: impl Into<String>) -> Self {
        Self::new(text, CommandKind::Read)
    }

    pub fn write(text: impl Into<String>) -> Self {
        Self::new(text, CommandKind::Write)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(text, CommandKind::Delete)
    }

    pub fn is_destructive(&self) -> bool {
        self.kind.is_destructive()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
