//! Terminal escape stripping.
//!
//! Devices paint prompts and pagination banners with colour codes, cursor
//! movement and the occasional OSC title. Everything except printable text and
//! the handful of C0 controls that carry layout is dropped before any pattern
//! is matched. The parser is kept alive between chunks so an escape sequence
//! split across two reads is still recognised.

use vte::{Parser, Perform};

const BACKSPACE: u8 = 0x08;

/// Streaming ANSI/VT stripper.
pub struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Strip escape sequences from `data`, appending the plain bytes to `out`.
    pub fn strip_into(&mut self, data: &[u8], out: &mut Vec<u8>) {
        let mut sink = PlainText { out };
        self.parser.advance(&mut sink, data);
    }

    /// Convenience wrapper returning a fresh vector.
    pub fn strip(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        self.strip_into(data, &mut out);
        out
    }
}

impl Default for AnsiStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnsiStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiStripper").finish_non_exhaustive()
    }
}

struct PlainText<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // Backspaces survive so pagination erase residue can be removed later.
        if matches!(byte, b'\n' | b'\r' | b'\t' | BACKSPACE) {
            self.out.push(byte);
        }
    }
}
