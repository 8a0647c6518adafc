//! Data-driven login handshake shared by most device families.
//!
//! A family describes its handshake as a [`HandshakeScript`]: an optional
//! elevation command (with optional secret prompt), a list of commands that
//! normalize the terminal, and an optional sub-shell to enter. Families that
//! need something the script cannot express implement [`Initializer`]
//! directly.

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::debug;
use regex::bytes::Regex as BytesRegex;
use tokio::time::Instant;

use super::Initializer;
use crate::channel::patterns::compile_bytes;
use crate::driver::{Session, SessionState};
use crate::error::{PlatformError, Result};

/// Privilege elevation step.
#[derive(Debug, Clone)]
pub struct Elevation {
    /// Command that requests elevated privileges (e.g. "enable").
    pub command: String,

    /// Pattern the device prints when it wants the secret.
    pub secret_prompt: Option<BytesRegex>,
}

/// Sub-shell entry step.
#[derive(Debug, Clone)]
pub struct ShellEntry {
    /// Command that enters the shell (e.g. "cli").
    pub command: String,

    /// Banner the shell prints once it is up. Without one the script waits
    /// for the session's shell settle delay instead.
    pub banner: Option<BytesRegex>,
}

/// Ordered handshake steps for one device family.
#[derive(Debug, Clone, Default)]
pub struct HandshakeScript {
    pub elevation: Option<Elevation>,
    pub normalize: Vec<String>,
    pub shell: Option<ShellEntry>,
}

impl HandshakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elevate with `command`, answering `secret_prompt` with the session's
    /// enable secret.
    pub fn with_elevation(
        mut self,
        command: impl Into<String>,
        secret_prompt: Option<&str>,
    ) -> std::result::Result<Self, PlatformError> {
        self.elevation = Some(Elevation {
            command: command.into(),
            secret_prompt: secret_prompt.map(compile_bytes).transpose()?,
        });
        Ok(self)
    }

    /// Add a terminal normalization command (pagination off, width, ...).
    pub fn with_normalize(mut self, command: impl Into<String>) -> Self {
        self.normalize.push(command.into());
        self
    }

    /// Enter a sub-shell with `command` after normalization.
    pub fn with_shell(
        mut self,
        command: impl Into<String>,
        banner: Option<&str>,
    ) -> std::result::Result<Self, PlatformError> {
        self.shell = Some(ShellEntry {
            command: command.into(),
            banner: banner.map(compile_bytes).transpose()?,
        });
        Ok(self)
    }

    async fn elevate(&self, session: &mut Session, deadline: Instant) -> Result<()> {
        session.advance(SessionState::Elevating)?;
        let Some(elevation) = &self.elevation else {
            return Ok(());
        };

        debug!("{}: elevating with '{}'", session.device_id(), elevation.command);
        session.write_line(&elevation.command, deadline).await?;

        let Some(secret_prompt) = &elevation.secret_prompt else {
            session.read_until_prompt(deadline).await?;
            return Ok(());
        };

        // The secret prompt may trail the echo by an AAA round trip.
        if session
            .read_until_pattern_or_prompt(secret_prompt, deadline)
            .await?
        {
            debug!("{}: device asked for the enable secret", session.device_id());
            session.write_secret(deadline).await?;
            session.read_until_prompt(deadline).await?;
        }
        Ok(())
    }

    async fn normalize(&self, session: &mut Session, deadline: Instant) -> Result<()> {
        for command in &self.normalize {
            debug!("{}: normalizing with '{}'", session.device_id(), command);
            session.write_line(command, deadline).await?;
            session.read_until_prompt(deadline).await?;
        }
        Ok(())
    }

    async fn enter_shell(&self, session: &mut Session, deadline: Instant) -> Result<()> {
        let Some(shell) = &self.shell else {
            return Ok(());
        };

        debug!("{}: entering shell with '{}'", session.device_id(), shell.command);
        session.write_line(&shell.command, deadline).await?;

        match &shell.banner {
            Some(banner) => {
                session.read_until_pattern(banner, deadline).await?;
            }
            None => {
                let settle: Duration = session.config().shell_settle;
                tokio::time::sleep_until((Instant::now() + settle).min(deadline)).await;
                session.read_until_quiet(deadline).await?;
            }
        }

        session.advance(SessionState::ShellEntered)?;
        Ok(())
    }
}

impl Initializer for HandshakeScript {
    fn handshake<'a>(&'a self, session: &'a mut Session) -> BoxFuture<'a, Result<()>> {
        async move {
            let deadline = Instant::now() + session.config().handshake_timeout;
            self.elevate(session, deadline).await?;
            self.normalize(session, deadline).await?;
            self.enter_shell(session, deadline).await
        }
        .boxed()
    }
}
