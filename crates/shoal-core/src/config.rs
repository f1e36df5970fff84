//! Config - ShoalConfig（worker pool の幅、callback の配送先）
//!
//! JSON で読み込み、validate で範囲外の値を弾きます。

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Where callbacks and store events are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Run callbacks on the worker that triggered them.
    Inline,

    /// Queue callbacks to an event loop driven by the host.
    #[default]
    EventLoop,
}

/// Configuration for the store and batch coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoalConfig {
    /// How many fetch operations may run at once. Default: 4.
    pub max_concurrent_fetches: usize,

    /// Callback delivery context. Default: event_loop.
    pub dispatch: DispatchMode,
}

impl Default for ShoalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            dispatch: DispatchMode::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ShoalConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_fetches",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_concurrent_fetches > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_fetches",
                reason: format!("must be at most {}", Semaphore::MAX_PERMITS),
            });
        }
        Ok(())
    }
}
