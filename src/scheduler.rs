use std::sync::Arc;

use crate::error::CacheError;
use crate::schedule::Schedule;

/// A unit of recurring work handed to a [`Scheduler`].
pub type Task = Arc<dyn Fn() + Send + Sync>;

/// A scheduler runs a task once after an initial delay and then at a fixed period.
///
/// Implementations must never run two invocations of the same task at once:
/// the next tick is only dispatched after the previous one has returned.
/// Tasks passed in by the cache never panic.
pub trait Scheduler: Send + Sync {
    /// A name for logging.
    ///
    /// # Example
    /// - "thread"
    /// - "tokio"
    /// - "manual"
    fn name(&self) -> &'static str;

    /// Arm `task` according to `schedule`.
    ///
    /// Implementations reject a schedule whose period is not positive.
    /// The returned handle cancels the task when dropped.
    fn schedule_at_fixed_rate(
        &self,
        schedule: &Schedule,
        task: Task,
    ) -> Result<TaskHandle, CacheError>;
}

/// Handle to an armed task.
///
/// Dropping the handle (or calling [`TaskHandle::cancel`]) stops future ticks.
/// A tick already in progress runs to completion.
pub struct TaskHandle {
    scheduler: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl TaskHandle {
    /// Create a handle that runs `cancel` once when the task is cancelled.
    pub fn new(scheduler: &'static str, cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        TaskHandle {
            scheduler,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Name of the scheduler that armed the task.
    pub fn scheduler(&self) -> &'static str {
        self.scheduler
    }

    /// Stop future ticks.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("scheduler", &self.scheduler)
            .field("cancelled", &self.cancel.is_none())
            .finish()
    }
}
