//! PTY channel abstraction for interactive sessions.
//!
//! Wraps the transport stream and provides the three bounded reads the engine
//! is built from: a raw chunk read, a read-until-quiet, and a read-until-prompt
//! that also walks through pagination.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};

use super::buffer::PatternBuffer;
use crate::error::ChannelError;
use crate::transport::Transport;

const READ_CHUNK: usize = 8192;

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// How long the device must stay silent for a quiet read to finish.
    pub quiet_period: Duration,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            search_depth: 1000,
            quiet_period: Duration::from_millis(300),
        }
    }
}

/// Pagination handling for [`PtyChannel::read_until_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct Pagination<'a> {
    /// Marker the device prints when it waits for a keystroke.
    pub marker: &'a Regex,

    /// Bytes that advance to the next page.
    pub keystroke: &'a [u8],
}

/// Result of a read operation.
#[derive(Debug)]
pub struct ReadResult {
    /// The data that was read, with pagination markers removed.
    pub data: Vec<u8>,

    /// Offset in `data` where the matched prompt starts.
    pub prompt_start: usize,

    /// Number of pagination markers that were skipped.
    pub pages: usize,
}

impl ReadResult {
    /// Get the data as a string (lossy UTF-8).
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// The prompt text that terminated the read, trimmed.
    pub fn prompt(&self) -> String {
        String::from_utf8_lossy(&self.data[self.prompt_start..])
            .trim()
            .to_string()
    }
}

/// High-level PTY channel for interactive device sessions.
pub struct PtyChannel {
    /// The transport stream, exclusively owned.
    stream: Box<dyn Transport>,

    /// Configuration for this channel.
    config: PtyConfig,

    /// Pattern buffer for accumulating output.
    buffer: PatternBuffer,

    /// Whether the stream is still usable.
    is_open: bool,
}

impl PtyChannel {
    /// Create a new PTY channel over an established stream.
    pub fn new(stream: impl Transport + 'static, config: PtyConfig) -> Self {
        Self {
            stream: Box::new(stream),
            buffer: PatternBuffer::new(config.search_depth),
            config,
            is_open: true,
        }
    }

    /// Check if the channel is open.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Clear the internal buffer.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    fn closed(&mut self, err: ChannelError) -> ChannelError {
        if matches!(err, ChannelError::Closed | ChannelError::Io(_)) {
            self.is_open = false;
        }
        err
    }

    /// Write bytes to the device, bounded by `deadline`.
    pub async fn write(&mut self, data: &[u8], deadline: Instant) -> Result<(), ChannelError> {
        if !self.is_open {
            return Err(ChannelError::Closed);
        }
        let started = Instant::now();
        let stream = &mut self.stream;
        let result = timeout_at(deadline, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.closed(e.into())),
            Err(_) => Err(ChannelError::PatternTimeout(started.elapsed())),
        }
    }

    /// Read one chunk from the device into the buffer.
    ///
    /// Returns the number of raw bytes read. End of stream is an error.
    async fn read_chunk(&mut self, deadline: Instant) -> Result<Option<usize>, ChannelError> {
        let mut chunk = [0u8; READ_CHUNK];
        match timeout_at(deadline, self.stream.read(&mut chunk)).await {
            Ok(Ok(0)) => Err(self.closed(ChannelError::Closed)),
            Ok(Ok(n)) => {
                trace!("read {} bytes: {:?}", n, String::from_utf8_lossy(&chunk[..n]));
                self.buffer.extend(&chunk[..n]);
                Ok(Some(n))
            }
            Ok(Err(e)) => Err(self.closed(e.into())),
            Err(_) => Ok(None),
        }
    }

    /// Read until the device has been silent for the quiet period, or until
    /// `deadline`, whichever comes first. Returns everything accumulated.
    ///
    /// Neither condition is an error: an idle device is the expected way for
    /// this read to end.
    pub async fn read_until_quiet(&mut self, deadline: Instant) -> Result<Vec<u8>, ChannelError> {
        loop {
            let window = (Instant::now() + self.config.quiet_period).min(deadline);
            match self.read_chunk(window).await? {
                Some(_) => continue,
                None => break,
            }
        }
        Ok(self.buffer.take())
    }

    /// Read until `pattern` appears anywhere in the buffer tail.
    pub async fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        deadline: Instant,
    ) -> Result<Vec<u8>, ChannelError> {
        let started = Instant::now();
        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }
            if self.read_chunk(deadline).await?.is_none() {
                return Err(ChannelError::PatternTimeout(started.elapsed()));
            }
        }
    }

    /// Read until one of `patterns` matches at the very end of the buffer.
    ///
    /// Returns the index of the pattern that matched (earlier patterns win)
    /// together with everything read.
    pub async fn read_until_any(
        &mut self,
        patterns: &[&Regex],
        deadline: Instant,
    ) -> Result<(usize, Vec<u8>), ChannelError> {
        let started = Instant::now();
        loop {
            let hit = patterns
                .iter()
                .position(|p| self.buffer.search_tail_end(p).is_some());
            if let Some(index) = hit {
                return Ok((index, self.buffer.take()));
            }
            if self.read_chunk(deadline).await?.is_none() {
                return Err(ChannelError::PatternTimeout(started.elapsed()));
            }
        }
    }

    /// Read until `prompt` matches at the very end of the buffer.
    ///
    /// When `pagination` is given, every marker that shows up in the tail is
    /// cut out of the buffer and the advance keystroke is sent, so the
    /// returned data is the concatenation of all pages. On timeout the
    /// partial output stays buffered.
    pub async fn read_until_prompt(
        &mut self,
        prompt: &Regex,
        pagination: Option<Pagination<'_>>,
        deadline: Instant,
    ) -> Result<ReadResult, ChannelError> {
        let started = Instant::now();
        let mut pages = 0;
        loop {
            if let Some(pager) = pagination {
                if self.buffer.remove_from_tail(pager.marker) {
                    pages += 1;
                    trace!("pagination marker #{} skipped", pages);
                    self.write(pager.keystroke, deadline).await?;
                    continue;
                }
            }

            if let Some((prompt_start, _)) = self.buffer.search_tail_end(prompt) {
                return Ok(ReadResult {
                    data: self.buffer.take(),
                    prompt_start,
                    pages,
                });
            }

            if self.read_chunk(deadline).await?.is_none() {
                return Err(ChannelError::PatternTimeout(started.elapsed()));
            }
        }
    }
}

impl std::fmt::Debug for PtyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChannel")
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .field("is_open", &self.is_open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(mock: tokio_test::io::Mock) -> PtyChannel {
        PtyChannel::new(
            mock,
            PtyConfig {
                search_depth: 1000,
                quiet_period: Duration::from_millis(50),
            },
        )
    }

    #[tokio::test]
    async fn test_read_until_quiet_returns_on_silence() {
        let mock = tokio_test::io::Builder::new()
            .read(b"\r\nrouter#")
            .wait(Duration::from_millis(500))
            .build();
        let mut channel = channel(mock);

        let deadline = Instant::now() + Duration::from_secs(5);
        let data = channel.read_until_quiet(deadline).await.unwrap();
        assert_eq!(data, b"\r\nrouter#");
    }

    #[tokio::test]
    async fn test_read_until_prompt_across_chunks() {
        let mock = tokio_test::io::Builder::new()
            .read(b"line one\r\nline ")
            .read(b"two\r\nrou")
            .read(b"ter#")
            .build();
        let mut channel = channel(mock);
        let prompt = Regex::new(r"(?m)^\w+#\s?$").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = channel.read_until_prompt(&prompt, None, deadline).await.unwrap();
        assert_eq!(result.prompt(), "router#");
        assert_eq!(result.pages, 0);
        assert!(result.as_str().starts_with("line one\r\nline two"));
    }

    #[tokio::test]
    async fn test_pagination_sends_keystroke() {
        let mock = tokio_test::io::Builder::new()
            .read(b"page one\r\n --More-- ")
            .write(b" ")
            .read(b"page two\r\nrouter#")
            .build();
        let mut channel = channel(mock);
        let prompt = Regex::new(r"(?m)^\w+#\s?$").unwrap();
        let marker = Regex::new(r" *--More-- *").unwrap();
        let pagination = Pagination {
            marker: &marker,
            keystroke: b" ",
        };

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = channel
            .read_until_prompt(&prompt, Some(pagination), deadline)
            .await
            .unwrap();
        assert_eq!(result.pages, 1);
        assert_eq!(result.as_str(), "page one\r\npage two\r\nrouter#");
    }

    #[tokio::test]
    async fn test_read_until_any_waits_for_slow_pattern() {
        let mock = tokio_test::io::Builder::new()
            .read(b"enable\r\n")
            .wait(Duration::from_millis(200))
            .read(b"Password: ")
            .build();
        let mut channel = channel(mock);
        let secret = Regex::new(r"(?i)password:\s*$").unwrap();
        let prompt = Regex::new(r"(?m)^\w+[>#]\s?$").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let (index, data) = channel
            .read_until_any(&[&secret, &prompt], deadline)
            .await
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(data, b"enable\r\nPassword: ");
    }

    #[tokio::test]
    async fn test_read_until_any_prefers_first_pattern() {
        let mock = tokio_test::io::Builder::new().read(b"router#").build();
        let mut channel = channel(mock);
        let anything = Regex::new(r"#$").unwrap();
        let prompt = Regex::new(r"(?m)^\w+#$").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let (index, _) = channel
            .read_until_any(&[&prompt, &anything], deadline)
            .await
            .unwrap();
        assert_eq!(index, 0);
    }

    #[tokio::test]
    async fn test_end_of_stream_closes_channel() {
        let mock = tokio_test::io::Builder::new().read(b"bye\r\n").build();
        let mut channel = channel(mock);
        let prompt = Regex::new(r"#\s*$").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let err = channel.read_until_prompt(&prompt, None, deadline).await.unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
        assert!(!channel.is_open());
    }
}
