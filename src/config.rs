//! Engine configuration. Risk thresholds are statutory and not configurable.

use crate::risk::MIN_CORRECTIVE_MEASURES_CHARS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory (assessment database)
    pub data_dir: PathBuf,
    /// Validation parameters
    pub risk: RiskConfig,
    /// Assessment store
    pub storage: StorageConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Minimum trimmed length of the corrective-measures text
    pub min_corrective_measures_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name inside `data_dir`
    pub db_file: String,
    /// Encrypt corrective-measures text at rest; the secret is read from `secret_env`
    pub encrypt_measures: bool,
    pub secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".bzr"),
            risk: RiskConfig::default(),
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_corrective_measures_chars: MIN_CORRECTIVE_MEASURES_CHARS,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: "assessments.db".to_string(),
            encrypt_measures: false,
            secret_env: "BZR_STORE_SECRET".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl EngineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<EngineConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.db_file)
    }
}
