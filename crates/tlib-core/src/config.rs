//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TlibError;
use crate::Result;

/// Settings applied when an `Engine` is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal places used by `print`.
    pub print_precision: usize,
    /// Seed for the process-wide RNG. `None` keeps the entropy-seeded one.
    pub seed: Option<u64>,
    /// Truncate printed data after this many elements.
    pub max_print_elements: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            print_precision: 2,
            seed: None,
            max_print_elements: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TlibError::Config(format!("Failed to parse engine config: {}", e)))
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TlibError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> String {
        // Plain struct of numbers and options; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
