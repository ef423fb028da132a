use serde::{Deserialize, Serialize};
use std::env;

use crate::cache::DEFAULT_NAME;
use crate::error::CacheError;
use crate::schedule::{DEFAULT_INITIAL_DELAY_MS, Schedule};

const DEFAULT_PERIOD_MS: i64 = 60_000;

/// Configuration for a refresh cache, loadable from JSON or environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshCacheConfig {
    /// Name used in logs and metrics.
    pub name: String,
    /// Time in milliseconds before the first scheduled refresh.
    pub initial_delay_ms: i64,
    /// Time in milliseconds between refreshes.
    pub period_ms: i64,
}

impl Default for RefreshCacheConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

impl RefreshCacheConfig {
    /// Load from `{prefix}_NAME`, `{prefix}_INITIAL_DELAY_MS` and `{prefix}_PERIOD_MS`.
    ///
    /// Missing variables take their defaults. A variable that is set but does not
    /// parse is a [`CacheError::Misconfiguration`].
    pub fn from_env(prefix: &str) -> Result<Self, CacheError> {
        let defaults = Self::default();
        Ok(Self {
            name: env::var(format!("{prefix}_NAME")).unwrap_or(defaults.name),
            initial_delay_ms: env_millis(&format!("{prefix}_INITIAL_DELAY_MS"))?
                .unwrap_or(defaults.initial_delay_ms),
            period_ms: env_millis(&format!("{prefix}_PERIOD_MS"))?
                .unwrap_or(defaults.period_ms),
        })
    }

    /// Parse from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::Misconfiguration(format!("Invalid cache config: {}", e)))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule::new(self.initial_delay_ms, self.period_ms)
    }
}

fn env_millis(var: &str) -> Result<Option<i64>, CacheError> {
    match env::var(var) {
        Ok(value) => value.trim().parse().map(Some).map_err(|e| {
            CacheError::Misconfiguration(format!("Invalid {}={:?}: {}", var, value, e))
        }),
        Err(_) => Ok(None),
    }
}
