//! A live session: one transport stream bound to one device family.

use std::fmt;

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use super::config::SessionConfig;
use super::state::SessionState;
use crate::channel::{Pagination, PtyChannel, ReadResult};
use crate::error::{ChannelError, DriverError};
use crate::platform::{DeviceFamily, Dialect};
use crate::transport::Transport;

/// One interactive session to one device.
///
/// Owns its transport exclusively. After initialization the session is
/// moved into its worker task and only touched from there, which is what
/// keeps commands on one device from interleaving.
pub struct Session {
    device_id: String,
    family: DeviceFamily,
    channel: PtyChannel,
    config: SessionConfig,
    state: SessionState,
    last_prompt: Option<String>,
    enable_secret: Option<SecretString>,
}

impl Session {
    /// Bind an established stream to a device family.
    pub fn new(
        device_id: impl Into<String>,
        family: DeviceFamily,
        stream: impl Transport + 'static,
        config: SessionConfig,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            channel: PtyChannel::new(stream, config.pty_config()),
            family,
            config,
            state: SessionState::Connected,
            last_prompt: None,
            enable_secret: None,
        }
    }

    /// Secret sent when privilege elevation asks for one.
    pub fn with_enable_secret(mut self, secret: SecretString) -> Self {
        self.enable_secret = Some(secret);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn family(&self) -> &DeviceFamily {
        &self.family
    }

    pub fn dialect(&self) -> &Dialect {
        &self.family.dialect
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The prompt observed when the session became ready.
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub(crate) fn set_last_prompt(&mut self, prompt: impl Into<String>) {
        self.last_prompt = Some(prompt.into());
    }

    /// Whether the transport is still usable.
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Move the lifecycle forward.
    pub fn advance(&mut self, to: SessionState) -> Result<(), DriverError> {
        let from = self.state;
        self.state = from.transition(to)?;
        debug!("{}: {} -> {}", self.device_id, from, to);
        Ok(())
    }

    /// Mark the session unusable. Idempotent.
    pub fn fail(&mut self) {
        if !self.state.is_failed() {
            debug!("{}: {} -> {}", self.device_id, self.state, SessionState::Failed);
            self.state = SessionState::Failed;
        }
    }

    /// Discard anything buffered from earlier reads.
    pub fn clear_buffer(&mut self) {
        self.channel.clear_buffer();
    }

    /// Write raw bytes.
    pub async fn write(&mut self, data: &[u8], deadline: Instant) -> Result<(), ChannelError> {
        self.channel.write(data, deadline).await
    }

    /// Write one line followed by the dialect's line terminator.
    pub async fn write_line(&mut self, line: &str, deadline: Instant) -> Result<(), ChannelError> {
        trace!("{}: send {:?}", self.device_id, line);
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(self.family.dialect.newline.as_bytes());
        self.channel.write(&data, deadline).await
    }

    /// Answer a secret prompt with the enable secret, or an empty line if
    /// there is none. Never logged.
    pub(crate) async fn write_secret(&mut self, deadline: Instant) -> Result<(), ChannelError> {
        let mut data = Vec::new();
        if let Some(secret) = &self.enable_secret {
            data.extend_from_slice(secret.expose_secret().as_bytes());
        }
        data.extend_from_slice(self.family.dialect.newline.as_bytes());
        self.channel.write(&data, deadline).await
    }

    /// Read until the device goes quiet or `deadline` passes.
    pub async fn read_until_quiet(&mut self, deadline: Instant) -> Result<String, ChannelError> {
        let data = self.channel.read_until_quiet(deadline).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Read until `pattern` shows up in the buffer tail.
    pub async fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        deadline: Instant,
    ) -> Result<String, ChannelError> {
        let data = self.channel.read_until_pattern(pattern, deadline).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Read until `pattern` or the dialect's prompt ends the output.
    /// Returns `true` when it was `pattern`.
    pub async fn read_until_pattern_or_prompt(
        &mut self,
        pattern: &Regex,
        deadline: Instant,
    ) -> Result<bool, ChannelError> {
        let dialect = self.family.dialect.clone();
        let (index, _) = self
            .channel
            .read_until_any(&[pattern, &dialect.prompt], deadline)
            .await?;
        Ok(index == 0)
    }

    /// Read until the dialect's prompt ends the output, paging through
    /// pagination markers on the way.
    pub async fn read_until_prompt(&mut self, deadline: Instant) -> Result<ReadResult, ChannelError> {
        let dialect = self.family.dialect.clone();
        let pagination = dialect.pagination.as_ref().map(|marker| Pagination {
            marker,
            keystroke: dialect.pagination_keystroke.as_bytes(),
        });
        self.channel
            .read_until_prompt(&dialect.prompt, pagination, deadline)
            .await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("family", &self.family.name)
            .field("state", &self.state)
            .field("last_prompt", &self.last_prompt)
            .field("channel", &self.channel)
            .finish()
    }
}
