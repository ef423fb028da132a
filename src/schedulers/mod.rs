//! Scheduler implementations.

pub mod manual;
pub mod thread;
pub mod tokio;
