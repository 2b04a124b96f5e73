//! Runtime configuration for the settings cache.

use serde::{Deserialize, Serialize};

/// Settings cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve reads from cached snapshots. When off, every read refetches.
    pub caching_enabled: bool,
    /// Issue the initial fetch as soon as the cache starts.
    pub preload: bool,
}

impl CacheConfig {
    /// Sets whether reads are served from the cache.
    #[must_use]
    pub const fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Sets whether the cache fetches on start.
    #[must_use]
    pub const fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the serde error when `input` is not a valid configuration object.
    pub fn from_json_str(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            preload: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = CacheConfig::from_json_str(r#"{"preload": false}"#).unwrap();
        assert!(config.caching_enabled);
        assert!(!config.preload);
        assert_eq!(CacheConfig::from_json_str("{}").unwrap(), CacheConfig::default());
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(CacheConfig::from_json_str(r#"{"caching_enabled": "yes"}"#).is_err());
    }
}
