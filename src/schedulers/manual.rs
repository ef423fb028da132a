use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::CacheError;
use crate::schedule::Schedule;
use crate::scheduler::{Scheduler, Task, TaskHandle};

struct ManualTask {
    task: Task,
    cancelled: Arc<AtomicBool>,
}

/// Scheduler that only fires when told to.
///
/// Each call to [`ManualScheduler::tick`] counts as one scheduled firing of every
/// armed task, regardless of the schedule's durations. Useful for driving a cache
/// deterministically in tests.
#[derive(Default)]
pub struct ManualScheduler {
    // Held for a whole tick so concurrent tick() calls never overlap a task
    tick_lock: Mutex<()>,
    tasks: Mutex<Vec<ManualTask>>,
    scheduled: Mutex<Vec<Schedule>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every armed, non-cancelled task once, in registration order.
    ///
    /// Concurrent calls are serialized. Returns the number of tasks that ran.
    pub fn tick(&self) -> usize {
        let Ok(_ticking) = self.tick_lock.lock() else {
            return 0;
        };

        // Snapshot so tasks can be armed or cancelled while they run
        let tasks: Vec<Task> = match self.tasks.lock() {
            Ok(mut tasks) => {
                tasks.retain(|t| !t.cancelled.load(Ordering::SeqCst));
                tasks.iter().map(|t| Arc::clone(&t.task)).collect()
            }
            Err(_) => return 0,
        };

        for task in &tasks {
            task();
        }
        tasks.len()
    }

    /// Schedules received so far, in order.
    pub fn scheduled(&self) -> Vec<Schedule> {
        self.scheduled
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of tasks that have not been cancelled.
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !t.cancelled.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn schedule_at_fixed_rate(
        &self,
        schedule: &Schedule,
        task: Task,
    ) -> Result<TaskHandle, CacheError> {
        schedule.validate()?;

        let cancelled = Arc::new(AtomicBool::new(false));
        self.tasks
            .lock()
            .map_err(|e| CacheError::scheduler(self.name(), e.to_string()))?
            .push(ManualTask {
                task,
                cancelled: cancelled.clone(),
            });
        self.scheduled
            .lock()
            .map_err(|e| CacheError::scheduler(self.name(), e.to_string()))?
            .push(*schedule);

        Ok(TaskHandle::new(self.name(), move || {
            cancelled.store(true, Ordering::SeqCst);
        }))
    }
}
