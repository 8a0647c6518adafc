//! Channel layer for pattern matching and PTY operations.
//!
//! This module turns a raw transport stream into bounded reads: escape
//! sequences are stripped as bytes arrive, prompts are found by searching
//! the tail of the buffer, and pagination markers are paged through.

mod ansi;
mod buffer;
pub(crate) mod patterns;
mod pty;

pub use ansi::AnsiStripper;
pub use buffer::PatternBuffer;
pub use patterns::compile_prompt_pattern;
pub use pty::{Pagination, PtyChannel, PtyConfig, ReadResult};
