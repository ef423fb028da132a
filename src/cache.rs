use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::builder::RefreshCacheBuilder;
use crate::error::CacheError;
use crate::metrics::{MetricsSink, RefreshMetric, RefreshStats, StatsRecorder};
use crate::producer::Producer;
use crate::schedule::Schedule;
use crate::scheduler::{Scheduler, Task, TaskHandle};
use crate::schedulers::thread::ThreadScheduler;
use crate::slot::ValueSlot;
use crate::utils::{elapsed_ms, now_ms, panic_message};

pub(crate) const DEFAULT_NAME: &str = "cache";

/// State shared between the cache and its scheduled task.
struct Inner<T> {
    name: String,
    slot: ValueSlot<T>,
    producer: Box<dyn Producer<T>>,
    stats: StatsRecorder,
    sink: Option<Arc<dyn MetricsSink>>,
}

impl<T> Inner<T>
where
    T: Send + Sync + 'static,
{
    /// Run the producer once and publish its value.
    ///
    /// Never panics and never returns an error: a failing or panicking producer
    /// is logged and the previous value stays in place. Aborting failures
    /// (out of memory, `panic = "abort"`) cannot be intercepted here and end the process.
    fn refresh(&self) {
        tracing::info!(cache = %self.name, "Proceeding to refresh");

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.producer.produce()));
        let latency_ms = elapsed_ms(start);

        let message = match outcome {
            Ok(Ok(value)) => {
                self.slot.store(value);
                self.stats.record_success(latency_ms, now_ms());
                tracing::info!(cache = %self.name, elapsed_ms = latency_ms, "Refresh completed");
                self.emit(RefreshMetric::Succeeded {
                    cache: self.name.clone(),
                    latency_ms,
                });
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("producer panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::error!(
            cache = %self.name,
            elapsed_ms = latency_ms,
            error = %message,
            "Refresh failed, keeping previous value"
        );
        self.stats.record_failure(latency_ms, &message);
        self.emit(RefreshMetric::Failed {
            cache: self.name.clone(),
            latency_ms,
            message,
        });
    }

    fn emit(&self, metric: RefreshMetric) {
        if let Some(sink) = &self.sink {
            sink.emit(metric);
        }
    }
}

/// A single value kept fresh by a background schedule.
///
/// The value is computed by a [`Producer`] and recomputed on every tick of a
/// [`Scheduler`]. Readers get the last successfully produced value without
/// blocking; a failed recomputation never discards it.
///
/// Dropping the cache cancels its scheduled refresh.
///
/// # Example
///
/// ```ignore
/// use refresh_cache::{RefreshCache, Schedule};
///
/// let rates = RefreshCache::with_default_scheduler(
///     || fetch_exchange_rates(),
///     Schedule::with_period(30_000),
/// )?;
///
/// // Populated synchronously because the initial delay is 0
/// let current = rates.read().expect("populated at construction");
/// ```
pub struct RefreshCache<T> {
    inner: Arc<Inner<T>>,
    schedule: Schedule,
    task: TaskHandle,
}

impl<T> RefreshCache<T>
where
    T: Send + Sync + 'static,
{
    /// Create a cache refreshed by `scheduler` according to `schedule`.
    ///
    /// If `schedule.initial_delay_ms < 1` the producer runs once before this returns.
    /// A failure in that run leaves the cache empty but does not fail construction.
    ///
    /// # Errors
    /// - `Misconfiguration` if the period is not positive
    /// - `Scheduler` if the scheduler cannot arm the refresh task
    pub fn new<P>(
        producer: P,
        scheduler: &dyn Scheduler,
        schedule: Schedule,
    ) -> Result<Self, CacheError>
    where
        P: Producer<T> + 'static,
    {
        Self::start(
            DEFAULT_NAME.to_string(),
            Box::new(producer),
            scheduler,
            schedule,
            None,
        )
    }

    /// Create a cache that owns a dedicated refresh thread.
    pub fn with_default_scheduler<P>(producer: P, schedule: Schedule) -> Result<Self, CacheError>
    where
        P: Producer<T> + 'static,
    {
        Self::new(producer, &ThreadScheduler::default(), schedule)
    }

    /// Start configuring a cache.
    pub fn builder() -> RefreshCacheBuilder<T> {
        RefreshCacheBuilder::new()
    }

    pub(crate) fn start(
        name: String,
        producer: Box<dyn Producer<T>>,
        scheduler: &dyn Scheduler,
        schedule: Schedule,
        sink: Option<Arc<dyn MetricsSink>>,
    ) -> Result<Self, CacheError> {
        schedule.validate()?;

        let inner = Arc::new(Inner {
            name,
            slot: ValueSlot::new(),
            producer,
            stats: StatsRecorder::new(),
            sink,
        });

        tracing::info!(
            cache = %inner.name,
            scheduler = scheduler.name(),
            initial_delay_ms = schedule.initial_delay_ms,
            period_ms = schedule.period_ms,
            "Cache refresh configured"
        );

        if schedule.refreshes_on_create() {
            inner.refresh();
        }

        // The task must not keep the cache alive on its own
        let weak = Arc::downgrade(&inner);
        let task: Task = Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.refresh();
            }
        });
        let task = scheduler.schedule_at_fixed_rate(&schedule.armed(), task)?;

        Ok(RefreshCache {
            inner,
            schedule,
            task,
        })
    }

    /// Return the most recently produced value, or `None` if no refresh has succeeded yet.
    ///
    /// Never blocks and never invokes the producer.
    pub fn read(&self) -> Option<Arc<T>> {
        self.inner.slot.load()
    }

    /// Like [`read`](Self::read), but clones the value out of the cache.
    pub fn read_cloned(&self) -> Option<T>
    where
        T: Clone,
    {
        self.read().map(|v| (*v).clone())
    }

    /// Whether at least one refresh has succeeded.
    pub fn is_populated(&self) -> bool {
        !self.inner.slot.is_empty()
    }

    pub fn stats(&self) -> RefreshStats {
        self.inner.stats.snapshot()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The schedule the cache was configured with.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Name of the scheduler driving this cache.
    pub fn scheduler_name(&self) -> &'static str {
        self.task.scheduler()
    }
}

impl<T> std::fmt::Debug for RefreshCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCache")
            .field("name", &self.inner.name)
            .field("schedule", &self.schedule)
            .field("populated", &!self.inner.slot.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::from_fn;
    use crate::schedulers::manual::ManualScheduler;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize + Send + Sync + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        (calls, move || calls_clone.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn test_delayed_start_is_empty_until_first_tick() {
        let scheduler = ManualScheduler::new();
        let (calls, next) = counter();
        let cache = RefreshCache::new(from_fn(next), &scheduler, Schedule::new(1_000, 5_000))
            .unwrap();

        assert!(cache.read().is_none());
        assert!(!cache.is_populated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.scheduled(), vec![Schedule::new(1_000, 5_000)]);

        scheduler.tick();
        assert_eq!(cache.read().as_deref(), Some(&1));
    }

    #[test]
    fn test_immediate_start_populates_before_returning() {
        let scheduler = ManualScheduler::new();
        let (calls, next) = counter();
        let cache = RefreshCache::new(from_fn(next), &scheduler, Schedule::new(0, 5_000))
            .unwrap();

        assert_eq!(cache.read().as_deref(), Some(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The synchronous refresh stands in for the tick at the initial delay
        assert_eq!(scheduler.scheduled(), vec![Schedule::new(5_000, 5_000)]);

        scheduler.tick();
        assert_eq!(cache.read().as_deref(), Some(&2));
    }

    #[test]
    fn test_negative_initial_delay_refreshes_on_create() {
        let scheduler = ManualScheduler::new();
        let cache = RefreshCache::new(from_fn(|| "ready"), &scheduler, Schedule::new(-10, 100))
            .unwrap();
        assert_eq!(cache.read_cloned(), Some("ready"));
    }

    #[test]
    fn test_failed_tick_keeps_previous_value() {
        let scheduler = ManualScheduler::new();
        let fail = Arc::new(AtomicUsize::new(0));
        let fail_clone = fail.clone();
        let cache = RefreshCache::new(
            move || -> Result<String, String> {
                if fail_clone.load(Ordering::SeqCst) == 1 {
                    Err("backend unavailable".to_string())
                } else {
                    Ok("v1".to_string())
                }
            },
            &scheduler,
            Schedule::new(0, 1_000),
        )
        .unwrap();
        assert_eq!(cache.read_cloned(), Some("v1".to_string()));

        fail.store(1, Ordering::SeqCst);
        scheduler.tick();
        scheduler.tick();

        assert_eq!(cache.read_cloned(), Some("v1".to_string()));
        let stats = cache.stats();
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.last_error.as_deref(), Some("backend unavailable"));
    }

    #[test]
    fn test_alternating_success_and_failure() {
        let scheduler = ManualScheduler::new();
        let outcomes = Arc::new(Mutex::new(vec![Ok("v2"), Err("flaky"), Ok("v1")]));
        let outcomes_clone = outcomes.clone();
        let cache = RefreshCache::new(
            move || -> Result<&'static str, &'static str> {
                outcomes_clone.lock().unwrap().pop().unwrap_or(Err("exhausted"))
            },
            &scheduler,
            Schedule::new(10, 10),
        )
        .unwrap();

        scheduler.tick();
        assert_eq!(cache.read_cloned(), Some("v1"));
        scheduler.tick();
        assert_eq!(cache.read_cloned(), Some("v1"));
        scheduler.tick();
        assert_eq!(cache.read_cloned(), Some("v2"));
    }

    #[test]
    fn test_failed_initial_refresh_does_not_fail_construction() {
        let scheduler = ManualScheduler::new();
        let cache = RefreshCache::<u32>::new(
            || -> Result<u32, String> { Err("not yet".to_string()) },
            &scheduler,
            Schedule::new(0, 1_000),
        )
        .unwrap();

        assert!(cache.read().is_none());
        assert_eq!(cache.stats().failures, 1);
        assert_eq!(scheduler.active_tasks(), 1);
    }

    #[test]
    fn test_panicking_producer_is_contained() {
        let scheduler = ManualScheduler::new();
        let (calls, next) = counter();
        let cache = RefreshCache::new(
            from_fn(move || {
                let n = next();
                if n == 2 {
                    panic!("corrupt payload");
                }
                n
            }),
            &scheduler,
            Schedule::new(0, 1_000),
        )
        .unwrap();
        assert_eq!(cache.read().as_deref(), Some(&1));

        scheduler.tick();
        assert_eq!(cache.read().as_deref(), Some(&1));
        assert_eq!(
            cache.stats().last_error.as_deref(),
            Some("producer panicked: corrupt payload")
        );

        // The schedule keeps running after the panic
        scheduler.tick();
        assert_eq!(cache.read().as_deref(), Some(&3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_missing_producer_is_invalid_argument() {
        let scheduler = Arc::new(ManualScheduler::new());
        let result = RefreshCache::<u32>::builder()
            .scheduler(scheduler.clone())
            .schedule(Schedule::new(0, 1_000))
            .build();

        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[test]
    fn test_non_positive_period_is_rejected_before_refresh() {
        let scheduler = ManualScheduler::new();
        let (calls, next) = counter();
        let result = RefreshCache::new(from_fn(next), &scheduler, Schedule::new(0, 0));

        assert!(matches!(result, Err(CacheError::Misconfiguration(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[test]
    fn test_drop_cancels_schedule() {
        let scheduler = ManualScheduler::new();
        let (calls, next) = counter();
        let cache = RefreshCache::new(from_fn(next), &scheduler, Schedule::new(0, 1_000))
            .unwrap();
        assert_eq!(cache.scheduler_name(), "manual");
        assert_eq!(scheduler.active_tasks(), 1);

        drop(cache);
        assert_eq!(scheduler.active_tasks(), 0);
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_reads_never_observe_partial_values() {
        let scheduler = ManualScheduler::new();
        let (_, next) = counter();
        let cache = RefreshCache::new(
            from_fn(move || vec![next(); 512]),
            &scheduler,
            Schedule::new(0, 1_000),
        )
        .unwrap();
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut last_seen = 0;
                    while !done.load(Ordering::SeqCst) {
                        let value = cache.read().unwrap();
                        let first = value[0];
                        assert!(value.iter().all(|&n| n == first), "torn value");
                        assert!(first >= last_seen, "went back from {last_seen} to {first}");
                        last_seen = first;
                    }
                });
            }

            for _ in 0..500 {
                scheduler.tick();
            }
            done.store(true, Ordering::SeqCst);
        });

        assert_eq!(cache.read().unwrap()[0], 501);
    }
}
