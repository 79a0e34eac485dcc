//! Platform registry.
//!
//! Maps platform ids to their [`PlatformTarget`]. The coordinator only reads
//! from it; targets are registered once at startup from the built-in table
//! and the `[[platforms.custom]]` configuration entries.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use fanout_config::PlatformsConfig;
use fanout_protocols::{MatchPattern, PlatformId, PlatformTarget, builtin_targets};

use crate::error::RegistryError;

/// Registry for platform targets.
pub struct PlatformRegistry {
    targets: DashMap<PlatformId, Arc<PlatformTarget>>,
    enabled: RwLock<Vec<PlatformId>>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            targets: DashMap::new(),
            enabled: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry holding the built-in platforms, with the default
    /// enabled set.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        for target in builtin_targets() {
            registry.replace(target);
        }
        registry.set_enabled(PlatformsConfig::default().enabled);
        registry
    }

    /// Build a registry from configuration: built-ins, then custom
    /// platforms (which may override a built-in with the same id).
    pub fn from_config(config: &PlatformsConfig) -> Result<Self, RegistryError> {
        let registry = Self::with_builtin();

        for custom in &config.custom {
            let pattern = MatchPattern::parse(&custom.url_pattern).map_err(|source| {
                RegistryError::InvalidPattern {
                    platform: custom.id.clone(),
                    source,
                }
            })?;
            let target = PlatformTarget::new(
                custom.id.clone(),
                custom.display_name(),
                pattern,
                custom.script_path(),
            );
            if registry.replace(target).is_some() {
                debug!("Custom platform '{}' overrides the built-in definition", custom.id);
            }
        }

        let mut enabled = Vec::with_capacity(config.enabled.len());
        for id in &config.enabled {
            if registry.contains(id) {
                enabled.push(id.clone());
            } else {
                warn!("Enabled platform '{}' is not registered, skipping", id);
            }
        }
        registry.set_enabled(enabled);

        Ok(registry)
    }

    /// Register a platform.
    ///
    /// Returns an error if a platform with the same id is already registered.
    pub fn register(&self, target: PlatformTarget) -> Result<(), RegistryError> {
        if self.targets.contains_key(&target.id) {
            return Err(RegistryError::AlreadyRegistered(target.id));
        }
        self.targets.insert(target.id.clone(), Arc::new(target));
        Ok(())
    }

    /// Register or overwrite a platform, returning the previous definition.
    pub fn replace(&self, target: PlatformTarget) -> Option<Arc<PlatformTarget>> {
        self.targets.insert(target.id.clone(), Arc::new(target))
    }

    /// Remove a platform. It is also dropped from the enabled set.
    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        self.targets
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.enabled.write().retain(|enabled| enabled != id);
        Ok(())
    }

    /// Get a platform by id.
    pub fn get(&self, id: &str) -> Option<Arc<PlatformTarget>> {
        self.targets.get(id).map(|target| target.clone())
    }

    /// Check if a platform is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    /// Registered platform ids, sorted.
    pub fn list_ids(&self) -> Vec<PlatformId> {
        let mut ids: Vec<_> = self.targets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// All registered targets, sorted by id.
    pub fn targets(&self) -> Vec<Arc<PlatformTarget>> {
        let mut targets: Vec<_> = self.targets.iter().map(|entry| entry.value().clone()).collect();
        targets.sort_by(|a, b| a.id.cmp(&b.id));
        targets
    }

    /// Platforms a fan-out targets when the caller names none.
    pub fn enabled(&self) -> Vec<PlatformId> {
        self.enabled.read().clone()
    }

    pub fn set_enabled(&self, enabled: Vec<PlatformId>) {
        *self.enabled.write() = enabled;
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
