//! Pattern buffer with tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt and
//! pagination patterns, rather than the entire output. For large outputs
//! (full configuration dumps, routing tables) this keeps every read O(N).

use bytes::{Buf, BytesMut};
use regex::bytes::{Match, Regex};

use super::ansi::AnsiStripper;

/// Buffer for accumulating device output and searching it for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated, escape-stripped output.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape parser state, carried across chunks.
    stripper: AnsiStripper,

    /// Scratch space reused for stripping.
    scratch: Vec<u8>,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            stripper: AnsiStripper::new(),
            scratch: Vec::with_capacity(1024),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        self.scratch.clear();
        self.stripper.strip_into(data, &mut self.scratch);
        self.buffer.extend_from_slice(&self.scratch);
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Offsets of the returned match are relative to the start of the
    /// search region, not the full buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Find the last match in the tail that is followed only by whitespace.
    ///
    /// This is how a prompt is recognised: a prompt-looking line in the
    /// middle of the output does not count, only one the device is sitting
    /// on. Returns absolute `(start, end)` offsets into the buffer.
    pub fn search_tail_end(&self, pattern: &Regex) -> Option<(usize, usize)> {
        let start = self.tail_start();
        let tail = &self.buffer[start..];
        let last = pattern.find_iter(tail).last()?;
        if tail[last.end()..].iter().all(u8::is_ascii_whitespace) {
            Some((start + last.start(), start + last.end()))
        } else {
            None
        }
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Remove the first match of `pattern` from the tail, returning whether
    /// anything was removed.
    pub fn remove_from_tail(&mut self, pattern: &Regex) -> bool {
        let start = self.tail_start();
        let Some((m_start, m_end)) = pattern
            .find(&self.buffer[start..])
            .map(|m| (start + m.start(), start + m.end()))
        else {
            return false;
        };
        let mut rest = self.buffer.split_off(m_start);
        rest.advance(m_end - m_start);
        self.buffer.unsplit(rest);
        true
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    #[cfg(test)]
    fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrouter#");

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
    }

    #[test]
    fn test_tail_end_ignores_prompt_lookalike_mid_output() {
        let mut buffer = PatternBuffer::new(200);
        let pattern = Regex::new(r"(?m)^[\w-]+#\s?$").unwrap();

        buffer.extend(b"show run\r\nhostname core#\r\ninterface Gi0/1\r\n");
        assert!(buffer.search_tail_end(&pattern).is_none());

        buffer.extend(b"core# ");
        let (start, _) = buffer.search_tail_end(&pattern).unwrap();
        assert_eq!(&buffer.as_slice()[start..start + 5], b"core#");
    }

    #[test]
    fn test_remove_from_tail() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"line1\r\n --More-- ");
        let marker = Regex::new(r" *--More-- *").unwrap();
        assert!(buffer.remove_from_tail(&marker));
        assert_eq!(buffer.as_slice(), b"line1\r\n");
        assert!(!buffer.remove_from_tail(&marker));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
