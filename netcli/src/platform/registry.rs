//! Global family registry for looking up device families by name.

use std::sync::RwLock;

use indexmap::IndexMap;
use log::error;
use once_cell::sync::Lazy;

use super::family::DeviceFamily;
use super::vendors;
use crate::error::PlatformError;

/// Global family registry.
static REGISTRY: Lazy<RwLock<FamilyRegistry>> = Lazy::new(|| {
    let mut registry = FamilyRegistry::new();
    registry.register_builtin_families();
    RwLock::new(registry)
});

/// Registry of device families, in registration order.
#[derive(Debug, Default)]
pub struct FamilyRegistry {
    families: IndexMap<String, DeviceFamily>,
}

impl FamilyRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            families: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<FamilyRegistry> {
        &REGISTRY
    }

    fn register_builtin_families(&mut self) {
        for built in vendors::builtin() {
            match built {
                Ok(family) => {
                    self.families.insert(family.name.clone(), family);
                }
                // Only reachable if a builtin pattern is broken.
                Err(e) => error!("skipping builtin family: {}", e),
            }
        }
    }

    /// Register a family. Names are unique.
    pub fn register(&mut self, family: DeviceFamily) -> Result<(), PlatformError> {
        if self.families.contains_key(&family.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: family.name.clone(),
            });
        }
        self.families.insert(family.name.clone(), family);
        Ok(())
    }

    /// Get a family by name.
    pub fn get(&self, name: &str) -> Option<&DeviceFamily> {
        self.families.get(name)
    }

    /// Check if a family is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
