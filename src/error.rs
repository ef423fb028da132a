/// Error type for cache construction.
///
/// Producer failures during a refresh never become a `CacheError`. They are
/// logged, counted in [`RefreshStats`](crate::RefreshStats) and reported as
/// [`RefreshMetric::Failed`](crate::RefreshMetric::Failed).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A required argument was missing or invalid at construction.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The schedule or configuration cannot produce a working cache.
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
    /// The scheduler could not arm the refresh task.
    #[error("[{scheduler}] scheduler error: {message}")]
    Scheduler { scheduler: String, message: String },
}

impl CacheError {
    /// Create a new scheduler error.
    pub fn scheduler(scheduler: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Scheduler {
            scheduler: scheduler.into(),
            message: message.into(),
        }
    }
}
