//! # netcli
//!
//! Async CLI session and command-execution engine for network devices.
//!
//! netcli opens an interactive line-oriented session to a device, drives the
//! vendor's login and privilege-escalation handshake, resolves the shell
//! prompt, and then runs commands with bounded-time reads. Pagination is
//! paged through transparently and output is classified against per-vendor
//! error signatures, so callers get either clean text or a typed failure.
//!
//! ## Features
//!
//! - Any tokio byte stream as transport, with a russh-based SSH adapter
//! - Built-in families: Cisco IOS, Arista EOS, Juniper JUNOS, Nokia SR OS,
//!   Casa CMTS and Linux; new ones register at runtime
//! - Efficient pattern buffer matching (tail search, ANSI stripping)
//! - One worker task per session: commands never interleave, every wait has
//!   a deadline
//! - Async API plus a blocking facade for synchronous collaborators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netcli::{Context, SessionBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netcli::Error> {
//!     let session = SessionBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .family("juniper_junos")
//!         .connect()
//!         .await?;
//!
//!     let ctx = Context::new("example");
//!     let output = session.read("show version", &ctx).await?;
//!     println!("{}", output);
//!
//!     let config = session.dump_config(&ctx).await?;
//!     println!("{} sections", config.sections.len());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CapturedOutput, Command, CommandKind, Context, Session, SessionBuilder, SessionConfig,
    SessionHandle, SessionState, SessionStatus, blocking_delete_and_read, blocking_read,
    blocking_write_and_read, initialize,
};
pub use error::{CommandError, Error, InitError, Result};
pub use platform::{
    DeviceFamily, Dialect, ErrorDescription, ErrorSignatureSet, classify, get_dialect,
    get_error_patterns,
};
pub use transport::{AuthMethod, HostKeyPolicy, SshConfig, Transport};
