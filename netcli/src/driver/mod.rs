//! Session engine.
//!
//! A [`Session`] binds one transport stream to one device family. The
//! [`initialize`] function runs the family handshake and resolves the prompt;
//! a [`SessionHandle`] then runs commands on it from a dedicated worker task.
//! [`SessionBuilder`] does all of this in one go, over SSH or over any
//! stream the caller already has.

mod blocking;
mod builder;
mod command;
mod config;
mod context;
mod executor;
mod initializer;
mod prompt;
mod response;
mod session;
mod state;

pub use blocking::{blocking_delete_and_read, blocking_read, blocking_write_and_read};
pub use builder::SessionBuilder;
pub use command::{Command, CommandKind};
pub use config::SessionConfig;
pub use context::{Context, DEFAULT_TARGET};
pub use executor::{SessionHandle, SessionStatus};
pub use initializer::initialize;
pub use prompt::resolve_prompt;
pub use response::CapturedOutput;
pub use session::Session;
pub use state::SessionState;
