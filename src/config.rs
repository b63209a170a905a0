//! Engine configuration
//!
//! `EngineConfig` is loaded from JSON; missing fields take their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Close the source when its own `next()` fails (rejects, throws, or
    /// returns a non-object) before propagating the error. When `false`, a
    /// failed source is left open.
    pub close_on_source_error: bool,
    /// Maximum microtasks drained per event loop tick
    pub max_microtasks_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            close_on_source_error: true,
            max_microtasks_per_tick: 10_000,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Failed to parse engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize engine config: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        if self.max_microtasks_per_tick == 0 {
            return Err(Error::ConfigError(
                "maxMicrotasksPerTick must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
