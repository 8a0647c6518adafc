//! Blocking facade for collaborators that are not async.
//!
//! Each call drives the same future as the async API on the runtime the
//! session was started on, so the deadline rules are identical. The session
//! must live on a multi-thread runtime: `Handle::block_on` does not drive
//! timers or IO of a current-thread runtime, so such sessions are refused
//! with [`DriverError::CurrentThreadRuntime`]. These must not be called from
//! inside an async task either: `Handle::block_on` panics there.

use tokio::runtime::{Handle, RuntimeFlavor};

use super::context::Context;
use super::executor::SessionHandle;
use crate::error::{DriverError, Result};

fn runtime(session: &SessionHandle) -> Result<&Handle> {
    let runtime = session.runtime();
    if runtime.runtime_flavor() == RuntimeFlavor::CurrentThread {
        return Err(DriverError::CurrentThreadRuntime.into());
    }
    Ok(runtime)
}

/// Run a read-only command. Device errors surface as
/// [`CommandError::Read`](crate::error::CommandError::Read).
pub fn blocking_read(command: &str, session: &SessionHandle, ctx: &Context) -> Result<String> {
    runtime(session)?.block_on(session.read(command, ctx))
}

/// Send create/update lines. Device errors surface as
/// [`CommandError::Write`](crate::error::CommandError::Write).
pub fn blocking_write_and_read(
    session: &SessionHandle,
    ctx: &Context,
    lines: &[&str],
) -> Result<String> {
    runtime(session)?.block_on(session.write_and_read(ctx, lines))
}

/// Send delete lines. Device errors surface as
/// [`CommandError::Delete`](crate::error::CommandError::Delete).
pub fn blocking_delete_and_read(
    session: &SessionHandle,
    ctx: &Context,
    lines: &[&str],
) -> Result<String> {
    runtime(session)?.block_on(session.delete_and_read(ctx, lines))
}
