//! Transport streams.
//!
//! The engine only needs a byte-oriented duplex stream to the device. Any
//! tokio stream qualifies (SSH channels, telnet sockets, in-memory pipes in
//! tests); [`open_shell`] is the built-in way to get one over SSH.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyPolicy, SshConfig, TerminalSize};
pub use ssh::{SshStream, open_shell};

use tokio::io::{AsyncRead, AsyncWrite};

/// A duplex byte stream to one device.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
