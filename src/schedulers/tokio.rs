use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::CacheError;
use crate::schedule::Schedule;
use crate::scheduler::{Scheduler, Task, TaskHandle};

/// Scheduler backed by a tokio runtime.
///
/// Each tick runs on the blocking pool (producers are synchronous) and is awaited
/// before the next tick is considered, so invocations never overlap. Missed ticks
/// are delayed, not replayed. Tasks stop when their handle is dropped or when the
/// runtime shuts down.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create a scheduler that spawns onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Create a scheduler for the runtime the caller is running on.
    pub fn current() -> Result<Self, CacheError> {
        let handle =
            Handle::try_current().map_err(|e| CacheError::scheduler("tokio", e.to_string()))?;
        Ok(Self::new(handle))
    }
}

impl Scheduler for TokioScheduler {
    fn name(&self) -> &'static str {
        "tokio"
    }

    fn schedule_at_fixed_rate(
        &self,
        schedule: &Schedule,
        task: Task,
    ) -> Result<TaskHandle, CacheError> {
        schedule.validate()?;

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let initial_delay = schedule.initial_delay();
        let period = schedule.period();

        self.handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + initial_delay, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    _ = interval.tick() => {}
                }

                let task = Arc::clone(&task);
                if let Err(e) = tokio::task::spawn_blocking(move || task()).await {
                    tracing::error!(error = %e, "Scheduled task aborted, stopping schedule");
                    break;
                }
            }
        });

        Ok(TaskHandle::new(self.name(), move || drop(cancel_tx)))
    }
}
