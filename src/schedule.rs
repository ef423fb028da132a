use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CacheError;

/// Initial delay used when only a period is given: refresh immediately.
pub const DEFAULT_INITIAL_DELAY_MS: i64 = 0;

/// When a cache refreshes.
///
/// The first scheduled refresh fires after `initial_delay_ms`, then every
/// `period_ms`. An initial delay below 1 ms requests an extra synchronous
/// refresh while the cache is being constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Time in milliseconds before the first scheduled refresh.
    pub initial_delay_ms: i64,
    /// Time in milliseconds between refreshes.
    pub period_ms: i64,
}

impl Schedule {
    pub fn new(initial_delay_ms: i64, period_ms: i64) -> Self {
        Schedule {
            initial_delay_ms,
            period_ms,
        }
    }

    /// Refresh immediately, then every `period_ms`.
    pub fn with_period(period_ms: i64) -> Self {
        Self::new(DEFAULT_INITIAL_DELAY_MS, period_ms)
    }

    /// Whether the cache is populated synchronously at construction.
    pub fn refreshes_on_create(&self) -> bool {
        self.initial_delay_ms < 1
    }

    /// Reject periods that cannot produce a recurring refresh.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.period_ms <= 0 {
            return Err(CacheError::Misconfiguration(format!(
                "refresh period must be positive, got {} ms",
                self.period_ms
            )));
        }
        Ok(())
    }

    /// The initial delay, with negative values clamped to zero.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms.max(0) as u64)
    }

    /// The period, with negative values clamped to zero.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(0) as u64)
    }

    /// The schedule handed to the scheduler.
    ///
    /// When the cache refreshes on create, that refresh takes the place of the
    /// tick at the initial delay, so the first scheduled tick moves one period out.
    pub fn armed(&self) -> Schedule {
        if self.refreshes_on_create() {
            Schedule::new(self.period_ms, self.period_ms)
        } else {
            *self
        }
    }
}
