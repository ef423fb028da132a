//! refresh-cache - A single-value cache kept fresh by a background schedule
//!
//! This library provides:
//! - Lock-free reads of the last successfully produced value
//! - Periodic recomputation driven by a pluggable scheduler
//! - Failure containment: a failing or panicking producer never discards the cached value
//! - Optional immediate population at construction
//!
//! # Example
//!
//! ```ignore
//! use refresh_cache::{RefreshCache, Schedule};
//!
//! fn main() -> Result<(), refresh_cache::CacheError> {
//!     // Refresh immediately, then every 30 seconds
//!     let settings = RefreshCache::builder()
//!         .name("settings")
//!         .producer(|| std::fs::read_to_string("/etc/app/settings.json"))
//!         .schedule(Schedule::with_period(30_000))
//!         .build()?;
//!
//!     if let Some(current) = settings.read() {
//!         println!("{}", current);
//!     }
//!     Ok(())
//! }
//! ```

mod builder;
mod cache;
mod config;
mod error;
mod metrics;
pub mod producer;
mod schedule;
mod scheduler;
pub mod schedulers;
mod slot;
mod utils;

// Re-export public API
pub use builder::RefreshCacheBuilder;
pub use cache::RefreshCache;
pub use config::RefreshCacheConfig;
pub use error::CacheError;
pub use metrics::{MetricsSink, RefreshMetric, RefreshStats};
pub use producer::{BoxError, Producer};
pub use schedule::{DEFAULT_INITIAL_DELAY_MS, Schedule};
pub use scheduler::{Scheduler, Task, TaskHandle};
pub use schedulers::manual::ManualScheduler;
pub use schedulers::thread::ThreadScheduler;
pub use schedulers::tokio::TokioScheduler;
pub use slot::ValueSlot;
