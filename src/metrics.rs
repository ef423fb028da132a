//! Refresh reporting.
//!
//! Every refresh tick is recorded in a [`RefreshStats`] snapshot kept by the cache
//! and, when configured, emitted as a [`RefreshMetric`] to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use refresh_cache::{RefreshCache, Schedule};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//! let cache = RefreshCache::builder()
//!     .name("exchange-rates")
//!     .producer(load_rates)
//!     .schedule(Schedule::with_period(30_000))
//!     .metrics_sink(sink.clone())
//!     .build()?;
//! ```

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::producer::BoxError;

/// Metrics emitted once per refresh tick.
#[derive(Debug, Clone)]
pub enum RefreshMetric {
    /// The producer returned a value and it was published.
    Succeeded {
        /// Name of the cache.
        cache: String,
        /// Time spent in the producer, in milliseconds.
        latency_ms: f64,
    },
    /// The producer failed; the previous value was kept.
    Failed {
        /// Name of the cache.
        cache: String,
        /// Time spent in the producer, in milliseconds.
        latency_ms: f64,
        /// Error or panic message.
        message: String,
    },
}

/// Trait for receiving refresh metrics.
///
/// # Example
///
/// ```ignore
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use refresh_cache::{BoxError, MetricsSink, RefreshMetric};
///
/// struct BufferedSink {
///     buffer: Mutex<Vec<RefreshMetric>>,
/// }
///
/// #[async_trait]
/// impl MetricsSink for BufferedSink {
///     fn emit(&self, metric: RefreshMetric) {
///         self.buffer.lock().unwrap().push(metric);
///     }
///
///     async fn flush(&self) -> Result<(), BoxError> {
///         // Send buffered metrics to your backend
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// Called on the scheduler's thread at the end of each tick.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: RefreshMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), BoxError>;
}

/// Point-in-time view of a cache's refresh history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshStats {
    /// Ticks whose producer returned a value.
    pub successes: u64,
    /// Ticks whose producer failed or panicked.
    pub failures: u64,
    /// Duration of the most recent tick, in milliseconds.
    pub last_latency_ms: Option<f64>,
    /// Unix milli timestamp of the most recent successful tick.
    pub last_success_at_ms: Option<i64>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Lock-free counters behind [`RefreshStats`]. Written only by the refreshing tick.
#[derive(Default)]
pub(crate) struct StatsRecorder {
    successes: AtomicU64,
    failures: AtomicU64,
    // f64 bits; u64::MAX means no tick yet
    last_latency_bits: AtomicU64,
    // 0 means no success yet
    last_success_at_ms: AtomicI64,
    last_error: Mutex<Option<String>>,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        StatsRecorder {
            last_latency_bits: AtomicU64::new(u64::MAX),
            ..Default::default()
        }
    }

    pub(crate) fn record_success(&self, latency_ms: f64, at_ms: i64) {
        self.last_latency_bits
            .store(latency_ms.to_bits(), Ordering::Release);
        self.last_success_at_ms.store(at_ms, Ordering::Release);
        self.successes.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failure(&self, latency_ms: f64, message: &str) {
        self.last_latency_bits
            .store(latency_ms.to_bits(), Ordering::Release);
        if let Ok(mut last_error) = self.last_error.lock() {
            *last_error = Some(message.to_string());
        }
        self.failures.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn snapshot(&self) -> RefreshStats {
        let latency_bits = self.last_latency_bits.load(Ordering::Acquire);
        let last_success = self.last_success_at_ms.load(Ordering::Acquire);
        RefreshStats {
            successes: self.successes.load(Ordering::Acquire),
            failures: self.failures.load(Ordering::Acquire),
            last_latency_ms: (latency_bits != u64::MAX).then(|| f64::from_bits(latency_bits)),
            last_success_at_ms: (last_success != 0).then_some(last_success),
            last_error: self.last_error.lock().ok().and_then(|e| e.clone()),
        }
    }
}
