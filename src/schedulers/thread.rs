use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::error::CacheError;
use crate::schedule::Schedule;
use crate::scheduler::{Scheduler, Task, TaskHandle};

/// Scheduler that runs each task on its own dedicated OS thread.
///
/// This is what a cache uses when no scheduler is injected, so every cache
/// owns its refresh thread and caches never contend for a shared timer.
/// Ticks run back to back on that thread, which rules out overlap. A tick
/// that overruns its period delays the next one rather than bursting.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    thread_name: String,
}

impl ThreadScheduler {
    /// Create a scheduler whose threads are named `thread_name`.
    pub fn new(thread_name: impl Into<String>) -> Self {
        ThreadScheduler {
            thread_name: thread_name.into(),
        }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new("refresh-cache")
    }
}

impl Scheduler for ThreadScheduler {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn schedule_at_fixed_rate(
        &self,
        schedule: &Schedule,
        task: Task,
    ) -> Result<TaskHandle, CacheError> {
        schedule.validate()?;

        // Dropping the sender wakes the thread out of its wait and ends the loop.
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let period = schedule.period();
        let mut next_tick = Instant::now() + schedule.initial_delay();

        thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match cancel_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    task();

                    next_tick += period;
                    let now = Instant::now();
                    if next_tick < now {
                        next_tick = now;
                    }
                }
            })
            .map_err(|e| CacheError::scheduler(self.name(), e.to_string()))?;

        Ok(TaskHandle::new(self.name(), move || drop(cancel_tx)))
    }
}
