//! Device family: the bundle a vendor contributes to the engine.

use std::fmt;
use std::sync::Arc;

use super::dialect::Dialect;
use super::handshake::HandshakeScript;
use super::signatures::ErrorSignatureSet;
use super::{DefaultBehavior, Initializer, VendorBehavior};

/// Everything the engine needs to drive one device family.
///
/// All parts are immutable and shared by every session of the family.
#[derive(Clone)]
pub struct DeviceFamily {
    /// Family name (e.g. "cisco_ios", "juniper_junos").
    pub name: String,

    /// How the family's CLI talks.
    pub dialect: Arc<Dialect>,

    /// Patterns that mark output as a device error.
    pub error_patterns: Arc<ErrorSignatureSet>,

    /// Login handshake.
    pub initializer: Arc<dyn Initializer>,

    /// Output post-processing.
    pub behavior: Arc<dyn VendorBehavior>,
}

impl DeviceFamily {
    /// Create a family from a dialect, with no error patterns, an empty
    /// handshake and no output post-processing.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            name: dialect.name.clone(),
            dialect: Arc::new(dialect),
            error_patterns: Arc::new(ErrorSignatureSet::empty()),
            initializer: Arc::new(HandshakeScript::default()),
            behavior: Arc::new(DefaultBehavior),
        }
    }

    pub fn with_error_patterns(mut self, patterns: ErrorSignatureSet) -> Self {
        self.error_patterns = Arc::new(patterns);
        self
    }

    pub fn with_initializer(mut self, initializer: impl Initializer + 'static) -> Self {
        self.initializer = Arc::new(initializer);
        self
    }

    pub fn with_behavior(mut self, behavior: impl VendorBehavior + 'static) -> Self {
        self.behavior = Arc::new(behavior);
        self
    }
}

impl fmt::Debug for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceFamily")
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field("error_patterns", &self.error_patterns.len())
            .field("initializer", &"<Initializer>")
            .field("behavior", &"<VendorBehavior>")
            .finish()
    }
}
