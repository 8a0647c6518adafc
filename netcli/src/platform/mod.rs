//! Device families for multi-vendor support.
//!
//! A family bundles a [`Dialect`] (prompt, pagination, config dump shape),
//! an [`ErrorSignatureSet`], an [`Initializer`] that runs the login
//! handshake, and an optional [`VendorBehavior`] for output post-processing.
//! Families live in a global registry so new vendors can be added without
//! touching the engine.

mod dialect;
mod family;
mod handshake;
mod registry;
mod signatures;
pub mod vendors;

use std::sync::Arc;

use futures_util::future::BoxFuture;

pub use dialect::{ConfigDump, Dialect, Newline, OutputMode};
pub use family::DeviceFamily;
pub use handshake::{Elevation, HandshakeScript, ShellEntry};
pub use registry::FamilyRegistry;
pub use signatures::{ErrorDescription, ErrorSignatureSet, classify};

use crate::driver::Session;
use crate::error::{PlatformError, Result};

/// Family-specific login handshake.
///
/// Runs the steps between "connected" and "prompt can be resolved":
/// privilege elevation, terminal normalization and sub-shell entry. The
/// engine resolves and checks the prompt afterwards.
pub trait Initializer: Send + Sync {
    fn handshake<'a>(&'a self, session: &'a mut Session) -> BoxFuture<'a, Result<()>>;
}

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Post-process captured output after echo and prompt are stripped.
    fn post_process_output(&self, output: &str) -> String {
        output.to_string()
    }
}

/// Behavior that leaves output untouched.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}

/// Look up a registered family by name.
pub fn get_family(family: &str) -> Result<DeviceFamily> {
    let registry = FamilyRegistry::global()
        .read()
        .map_err(|_| PlatformError::InvalidDefinition {
            message: "family registry lock poisoned".to_string(),
        })?;

    registry.get(family).cloned().ok_or_else(|| {
        PlatformError::UnknownFamily {
            name: family.to_string(),
        }
        .into()
    })
}

/// Register a custom family in the global registry.
pub fn register_family(family: DeviceFamily) -> Result<()> {
    let mut registry =
        FamilyRegistry::global()
            .write()
            .map_err(|_| PlatformError::InvalidDefinition {
                message: "family registry lock poisoned".to_string(),
            })?;
    registry.register(family)?;
    Ok(())
}

/// The dialect of a registered family.
pub fn get_dialect(family: &str) -> Result<Arc<Dialect>> {
    Ok(get_family(family)?.dialect)
}

/// The error signatures of a registered family.
pub fn get_error_patterns(family: &str) -> Result<Arc<ErrorSignatureSet>> {
    Ok(get_family(family)?.error_patterns)
}
