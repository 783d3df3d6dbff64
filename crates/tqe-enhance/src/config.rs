//! Enhancement configuration

use crate::manifest::ManifestLocation;
use serde::{Deserialize, Serialize};

/// Default agent debug level
pub const DEFAULT_DEBUG_LEVEL: u8 = 2;

/// Default primary progress label
pub const DEFAULT_PROGRESS_LABEL: &str = "Ebean query bean enhancement";

/// Options handed to the transformer when it is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    /// Agent log verbosity (0 = silent)
    pub debug: u8,
}

impl AgentOptions {
    /// Agent argument string (`debug=2`)
    #[must_use]
    pub fn to_agent_args(&self) -> String {
        format!("debug={}", self.debug)
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            debug: DEFAULT_DEBUG_LEVEL,
        }
    }
}

/// Configuration for one enhancement pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Where manifests are looked for
    pub manifest: ManifestLocation,
    /// Transformer options
    pub agent: AgentOptions,
    /// Primary progress text while the batch runs
    pub progress_label: String,
    /// Bound on memoized fallback class lookups per batch
    pub resolver_cache_capacity: u64,
}

impl EnhanceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With agent debug level
    #[inline]
    #[must_use]
    pub fn with_debug_level(mut self, debug: u8) -> Self {
        self.agent.debug = debug;
        self
    }

    /// With manifest location
    #[inline]
    #[must_use]
    pub fn with_manifest(mut self, manifest: ManifestLocation) -> Self {
        self.manifest = manifest;
        self
    }

    /// With resolver cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.resolver_cache_capacity = capacity;
        self
    }
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            manifest: ManifestLocation::default(),
            agent: AgentOptions::default(),
            progress_label: DEFAULT_PROGRESS_LABEL.to_string(),
            resolver_cache_capacity: 1_024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EnhanceConfig::new();
        assert_eq!(config.agent.to_agent_args(), "debug=2");
        assert_eq!(config.progress_label, "Ebean query bean enhancement");
        assert_eq!(config.manifest.file_name, "ebean-typequery.mf");
    }

    #[test]
    fn builders() {
        let config = EnhanceConfig::new().with_debug_level(0).with_cache_capacity(8);
        assert_eq!(config.agent.debug, 0);
        assert_eq!(config.resolver_cache_capacity, 8);
    }
}
