//! Builder API for creating refresh caches.

use std::sync::Arc;

use crate::cache::{DEFAULT_NAME, RefreshCache};
use crate::config::RefreshCacheConfig;
use crate::error::CacheError;
use crate::metrics::MetricsSink;
use crate::producer::Producer;
use crate::schedule::Schedule;
use crate::scheduler::Scheduler;
use crate::schedulers::thread::ThreadScheduler;

/// Builder for [`RefreshCache`].
///
/// A producer and a schedule are required. Without an injected scheduler the
/// cache gets a dedicated [`ThreadScheduler`] named after the cache.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use refresh_cache::{RefreshCache, RefreshCacheConfig, TokioScheduler};
///
/// let config = RefreshCacheConfig::from_env("CATALOG_CACHE")?;
/// let catalog = RefreshCache::builder()
///     .config(&config)
///     .producer(|| load_catalog())
///     .scheduler(Arc::new(TokioScheduler::current()?))
///     .build()?;
/// ```
pub struct RefreshCacheBuilder<T> {
    name: String,
    producer: Option<Box<dyn Producer<T>>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    schedule: Option<Schedule>,
    sink: Option<Arc<dyn MetricsSink>>,
}

impl<T> RefreshCacheBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new RefreshCacheBuilder.
    pub fn new() -> Self {
        RefreshCacheBuilder {
            name: DEFAULT_NAME.to_string(),
            producer: None,
            scheduler: None,
            schedule: None,
            sink: None,
        }
    }

    /// Name used in logs, metrics and the default refresh thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The function computing the cached value.
    pub fn producer<P>(mut self, producer: P) -> Self
    where
        P: Producer<T> + 'static,
    {
        self.producer = Some(Box::new(producer));
        self
    }

    /// Drive refreshes with `scheduler` instead of a dedicated thread.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Emit a metric per refresh tick to `sink`.
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Take the name and schedule from `config`.
    pub fn config(self, config: &RefreshCacheConfig) -> Self {
        self.name(config.name.clone()).schedule(config.schedule())
    }

    /// Build the cache, returning a RefreshCache instance.
    ///
    /// # Errors
    /// - `InvalidArgument` if no producer or schedule was given
    /// - `Misconfiguration` if the period is not positive
    /// - `Scheduler` if the refresh task cannot be armed
    pub fn build(self) -> Result<RefreshCache<T>, CacheError> {
        let producer = self
            .producer
            .ok_or_else(|| CacheError::InvalidArgument("producer cannot be None".to_string()))?;
        let schedule = self
            .schedule
            .ok_or_else(|| CacheError::InvalidArgument("schedule cannot be None".to_string()))?;

        match self.scheduler {
            Some(scheduler) => {
                RefreshCache::start(self.name, producer, scheduler.as_ref(), schedule, self.sink)
            }
            None => {
                let scheduler = ThreadScheduler::new(format!("refresh-{}", self.name));
                RefreshCache::start(self.name, producer, &scheduler, schedule, self.sink)
            }
        }
    }
}

impl<T> Default for RefreshCacheBuilder<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
