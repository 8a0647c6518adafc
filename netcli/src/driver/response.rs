//! Captured output of a command.

use std::time::Duration;

use super::command::Command;

/// Output captured for one successful command.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// The command that was executed.
    pub command: Command,

    /// The command output (echo, trailing prompt and paging residue removed).
    pub text: String,

    /// The raw output before normalization.
    pub raw: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Number of pagination markers that were skipped.
    pub pages: usize,
}

impl CapturedOutput {
    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl std::fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
