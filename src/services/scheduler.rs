//! Repeating timers.
//!
//! A scheduled task only ever calls its tick function, which in this crate
//! always posts a [`ShellEvent`](crate::types::event::ShellEvent) to the
//! event loop. Cancelling a [`TaskHandle`] guarantees the tick function is
//! not called again; ticks already posted carry the [`TaskId`] so the loop
//! can discard them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::types::event::TaskId;

/// Called on every tick with the id of the task that fired.
pub type TickFn = Box<dyn Fn(TaskId) + Send + Sync>;

/// Trait defining the timer interface used by sessions and the inactivity tracker.
pub trait Scheduler: Send + Sync {
    /// Calls `tick` every `period`, first after one full period.
    fn every(&self, period: Duration, tick: TickFn) -> TaskHandle;
}

/// Owner of a scheduled repeating task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { id, cancelled, abort }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Stops the task. Safe to call more than once.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scheduler backed by tokio timers on a runtime owned elsewhere.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, tick: TickFn) -> TaskHandle {
        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let join = self.handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                tick(id);
            }
        });

        log::debug!("Scheduled task {} every {:?}", id, period);
        TaskHandle::new(id, cancelled, Some(join.abort_handle()))
    }
}

struct ManualTask {
    id: TaskId,
    period: Duration,
    cancelled: Arc<AtomicBool>,
    tick: Arc<dyn Fn(TaskId) + Send + Sync>,
}

/// Scheduler whose tasks only fire when [`ManualScheduler::fire_all`] is called.
///
/// Used by the headless demo and by tests to drive timers deterministically.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<ManualTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<ManualTask>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fires every task that has not been cancelled once. Returns how many fired.
    pub fn fire_all(&self) -> usize {
        let due: Vec<(TaskId, Arc<dyn Fn(TaskId) + Send + Sync>)> = self
            .tasks()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| (t.id, t.tick.clone()))
            .collect();
        for (id, tick) in &due {
            tick(*id);
        }
        due.len()
    }

    /// Fires a single task if it is still active.
    pub fn fire(&self, id: TaskId) -> bool {
        let tick = self
            .tasks()
            .iter()
            .find(|t| t.id == id && !t.cancelled.load(Ordering::SeqCst))
            .map(|t| t.tick.clone());
        match tick {
            Some(tick) => {
                tick(id);
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.tasks()
            .iter()
            .filter(|t| t.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Total number of tasks ever scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.tasks().len()
    }

    /// Periods of the tasks still active.
    pub fn active_periods(&self) -> Vec<Duration> {
        self.tasks()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::SeqCst))
            .map(|t| t.period)
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, tick: TickFn) -> TaskHandle {
        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.tasks().push(ManualTask {
            id,
            period,
            cancelled: cancelled.clone(),
            tick: Arc::from(tick),
        });
        TaskHandle::new(id, cancelled, None)
    }
}
