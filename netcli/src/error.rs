//! Error types for netcli.
//!
//! Failures are layered the same way the engine is: the transport that
//! produced the byte stream, the channel reading it, the initializer that
//! brought the session up, and the executor running individual commands.
//! Everything that reaches a collaborator names the device (and the command,
//! where there is one) so it can be diagnosed without the live session.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::platform::ErrorDescription;

/// Main error type for netcli operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel read/write errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session bookkeeping errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Fatal handshake failure for one device
    #[error(transparent)]
    Init(#[from] InitError),

    /// Per-command failure
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Device family definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// True if this error is a task/transport interruption that must be
    /// propagated to the caller as-is.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Interrupted))
    }

    /// True if the failure was a deadline expiring.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Command(CommandError::Timeout { .. })
                | Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Transport(TransportError::Timeout(_))
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key is not in known_hosts and verification is strict
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (reading and writing the device stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// The task waiting on the channel was interrupted
    #[error("Interrupted while waiting on the device")]
    Interrupted,

    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::Interrupted => ChannelError::Interrupted,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => ChannelError::Closed,
            _ => ChannelError::Io(err),
        }
    }
}

/// Session bookkeeping errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The session's command worker is gone
    #[error("Session for '{device}' is closed")]
    SessionClosed { device: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Lifecycle state may only move forward
    #[error("Illegal session state transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    /// Commands were submitted before initialization finished
    #[error("Session for '{device}' is not ready (state {state})")]
    NotReady { device: String, state: String },

    /// A session worker was started outside a tokio runtime
    #[error("No tokio runtime to run the session worker on")]
    NoRuntime,

    /// Blocking call on a session whose runtime cannot drive it from outside
    #[error("Blocking calls need a multi-thread tokio runtime")]
    CurrentThreadRuntime,
}

/// Fatal initialization failures. The session is unusable afterwards.
#[derive(Error, Debug)]
pub enum InitError {
    /// Handshake finished but the device never left its restricted shell.
    #[error("Unable to initialize device '{device}': unsupported prompt '{prompt}'")]
    UnsupportedPrompt { device: String, prompt: String },

    /// Timeout or transport failure while running the handshake.
    #[error("Unable to initialize device '{device}': {source}")]
    Handshake {
        device: String,
        #[source]
        source: Box<Error>,
    },
}

impl InitError {
    /// Device the failure belongs to.
    pub fn device(&self) -> &str {
        match self {
            InitError::UnsupportedPrompt { device, .. } | InitError::Handshake { device, .. } => {
                device
            }
        }
    }
}

/// Per-command failures, always tagged with the device and command text.
#[derive(Error, Debug)]
pub enum CommandError {
    /// No prompt was observed before the deadline.
    #[error("Command '{command}' on '{device}' timed out after {timeout:?}")]
    Timeout {
        device: String,
        command: String,
        timeout: Duration,
    },

    /// A read-only command produced a known vendor error.
    #[error("Read '{command}' on '{device}' failed: {description}")]
    Read {
        device: String,
        command: String,
        description: ErrorDescription,
    },

    /// A create/update command produced a known vendor error.
    #[error("Write '{command}' on '{device}' failed: {description}")]
    Write {
        device: String,
        command: String,
        description: ErrorDescription,
    },

    /// A delete command produced a known vendor error.
    #[error("Delete '{command}' on '{device}' failed: {description}")]
    Delete {
        device: String,
        command: String,
        description: ErrorDescription,
    },

    /// The transport failed while the command was in flight.
    #[error("Command '{command}' on '{device}' failed: {source}")]
    Channel {
        device: String,
        command: String,
        #[source]
        source: ChannelError,
    },

    /// An earlier failure left the session unusable; the owner must recreate it.
    #[error("Session for '{device}' is unusable, '{command}' was not sent")]
    SessionUnusable { device: String, command: String },
}

impl CommandError {
    /// Device the command was sent to.
    pub fn device(&self) -> &str {
        match self {
            CommandError::Timeout { device, .. }
            | CommandError::Read { device, .. }
            | CommandError::Write { device, .. }
            | CommandError::Delete { device, .. }
            | CommandError::Channel { device, .. }
            | CommandError::SessionUnusable { device, .. } => device,
        }
    }

    /// Command text that failed.
    pub fn command(&self) -> &str {
        match self {
            CommandError::Timeout { command, .. }
            | CommandError::Read { command, .. }
            | CommandError::Write { command, .. }
            | CommandError::Delete { command, .. }
            | CommandError::Channel { command, .. }
            | CommandError::SessionUnusable { command, .. } => command,
        }
    }

    /// The classified vendor error, if this failure came from the classifier.
    pub fn description(&self) -> Option<&ErrorDescription> {
        match self {
            CommandError::Read { description, .. }
            | CommandError::Write { description, .. }
            | CommandError::Delete { description, .. } => Some(description),
            _ => None,
        }
    }
}

/// Device family definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid family definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// A builtin or user-supplied pattern failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Family name not present in the registry
    #[error("Unknown device family '{name}'")]
    UnknownFamily { name: String },

    /// Family name registered twice
    #[error("Device family '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Result type alias using netcli's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_interrupted_maps_to_interrupted() {
        let err: ChannelError = io::Error::from(io::ErrorKind::Interrupted).into();
        assert!(matches!(err, ChannelError::Interrupted));
        assert!(Error::from(err).is_interrupted());
    }

    #[test]
    fn test_io_reset_maps_to_closed() {
        let err: ChannelError = io::Error::from(io::ErrorKind::ConnectionReset).into();
        assert!(matches!(err, ChannelError::Closed));
    }

    #[test]
    fn test_command_error_names_device_and_command() {
        let err = CommandError::Timeout {
            device: "edge1".into(),
            command: "show version".into(),
            timeout: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("edge1"));
        assert!(msg.contains("show version"));
        assert_eq!(err.device(), "edge1");
        assert!(Error::from(err).is_timeout());
    }

    #[test]
    fn test_handshake_error_keeps_cause() {
        let err = InitError::Handshake {
            device: "edge1".into(),
            source: Box::new(ChannelError::Closed.into()),
        };
        assert_eq!(err.device(), "edge1");
        assert!(err.to_string().contains("Channel closed"));
    }
}
