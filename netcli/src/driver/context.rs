//! Diagnostic context passed explicitly by collaborators.

use std::time::Duration;

/// Log target used when a context does not name one.
pub const DEFAULT_TARGET: &str = "netcli";

/// Per-call diagnostic context.
///
/// Collaborators pass one of these with every command so the engine logs
/// under their target and can label messages with what they are doing.
#[derive(Debug, Clone)]
pub struct Context {
    label: String,
    target: String,
    timeout: Option<Duration>,
}

impl Context {
    /// Context labelled `label`, logging under the default target.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: DEFAULT_TARGET.to_string(),
            timeout: None,
        }
    }

    /// Log under `target` instead of the default.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Override the session's command timeout for calls made with this
    /// context.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("")
    }
}
