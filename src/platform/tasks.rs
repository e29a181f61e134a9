//! Worker task scheduling

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde::Serialize;

use crate::fault::Fault;

/// Identifies a spawned worker task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TaskHandle(pub u64);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Handed to a task body; set once the scheduler terminates the task
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    cancelled: Arc<AtomicBool>,
}

impl TaskContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task bodies check this between units of work and stop when set
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Task body
pub type TaskEntry = Box<dyn FnOnce(TaskContext) + Send + 'static>;

/// External task service
pub trait TaskScheduler: Send + Sync {
    fn spawn(&self, name: &str, entry: TaskEntry) -> Result<TaskHandle, Fault>;

    /// Stops a running task. The task observes this through its [`TaskContext`].
    fn terminate(&self, handle: TaskHandle) -> Result<(), Fault>;
}

/// Runs each task on its own OS thread
#[derive(Debug, Default)]
pub struct ThreadScheduler {
    next_id: AtomicU64,
    live: Arc<Mutex<HashMap<u64, TaskContext>>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks spawned and not yet finished or terminated
    pub fn live_tasks(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl TaskScheduler for ThreadScheduler {
    fn spawn(&self, name: &str, entry: TaskEntry) -> Result<TaskHandle, Fault> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let ctx = TaskContext::new();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, ctx.clone());

        let live = Arc::clone(&self.live);
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            entry(ctx);
            live.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
        });

        match spawned {
            Ok(_) => Ok(TaskHandle(id)),
            Err(e) => {
                self.live
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
                Err(Fault::Task(format!("failed to spawn {}: {}", name, e)))
            }
        }
    }

    fn terminate(&self, handle: TaskHandle) -> Result<(), Fault> {
        let ctx = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .ok_or_else(|| Fault::Task(format!("{} is not running", handle)))?;
        ctx.cancel();
        Ok(())
    }
}

struct QueuedTask {
    handle: TaskHandle,
    name: String,
    entry: TaskEntry,
    ctx: TaskContext,
}

#[derive(Default)]
struct ManualQueue {
    tasks: VecDeque<QueuedTask>,
    fail_spawn: Option<String>,
    fail_terminate: Option<String>,
}

/// Queues tasks and runs them only when asked
///
/// Makes worker interleavings deterministic in tests and simulations.
#[derive(Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    queue: Mutex<ManualQueue>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next spawn fails with `message`
    pub fn fail_next_spawn(&self, message: impl Into<String>) {
        self.lock().fail_spawn = Some(message.into());
    }

    /// The next terminate fails with `message`
    pub fn fail_next_terminate(&self, message: impl Into<String>) {
        self.lock().fail_terminate = Some(message.into());
    }

    /// Tasks spawned and not yet run or terminated
    pub fn pending(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Names of the pending tasks, oldest first
    pub fn pending_names(&self) -> Vec<String> {
        self.lock().tasks.iter().map(|t| t.name.clone()).collect()
    }

    /// Runs the oldest pending task to completion. Returns false when idle.
    pub fn run_next(&self) -> bool {
        // Never hold the queue while a task body runs
        let next = self.lock().tasks.pop_front();
        match next {
            Some(task) => {
                (task.entry)(task.ctx);
                true
            }
            None => false,
        }
    }

    /// Runs pending tasks until none are left; returns how many ran
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending_names())
            .finish()
    }
}

impl TaskScheduler for ManualScheduler {
    fn spawn(&self, name: &str, entry: TaskEntry) -> Result<TaskHandle, Fault> {
        let mut queue = self.lock();
        if let Some(message) = queue.fail_spawn.take() {
            return Err(Fault::Task(message));
        }
        let handle = TaskHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        queue.tasks.push_back(QueuedTask {
            handle,
            name: name.to_string(),
            entry,
            ctx: TaskContext::new(),
        });
        Ok(handle)
    }

    fn terminate(&self, handle: TaskHandle) -> Result<(), Fault> {
        let mut queue = self.lock();
        if let Some(message) = queue.fail_terminate.take() {
            return Err(Fault::Task(message));
        }
        let position = queue
            .tasks
            .iter()
            .position(|t| t.handle == handle)
            .ok_or_else(|| Fault::Task(format!("{} is not pending", handle)))?;
        if let Some(task) = queue.tasks.remove(position) {
            task.ctx.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_thread_scheduler_runs_task() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler
            .spawn(
                "probe",
                Box::new(move |ctx| {
                    tx.send(ctx.is_cancelled()).unwrap();
                }),
            )
            .unwrap();
        assert!(!rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_thread_scheduler_terminate_sets_context() {
        let scheduler = ThreadScheduler::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let handle = scheduler
            .spawn(
                "spinner",
                Box::new(move |ctx| {
                    started_tx.send(()).unwrap();
                    while !ctx.is_cancelled() {
                        thread::sleep(Duration::from_millis(1));
                    }
                    done_tx.send(()).unwrap();
                }),
            )
            .unwrap();

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        scheduler.terminate(handle).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(scheduler.terminate(handle).is_err());
    }

    #[test]
    fn test_manual_scheduler_runs_on_demand() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicU64::new(0));
        for _ in 0..3 {
            let c = Arc::clone(&counter);
            scheduler
                .spawn("t", Box::new(move |_| {
                    c.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap();
        }
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(counter.load(Ordering::Relaxed), 0);

        assert!(scheduler.run_next());
        assert_eq!(counter.load(Ordering::Relaxed), 1);
        assert_eq!(scheduler.run_all(), 2);
        assert!(!scheduler.run_next());
    }

    #[test]
    fn test_manual_scheduler_terminate_drops_task() {
        let scheduler = ManualScheduler::new();
        let handle = scheduler.spawn("t", Box::new(|_| panic!("must not run"))).unwrap();
        scheduler.terminate(handle).unwrap();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.run_all(), 0);
        assert!(scheduler.terminate(handle).is_err());
    }

    #[test]
    fn test_manual_scheduler_injected_failures() {
        let scheduler = ManualScheduler::new();
        scheduler.fail_next_spawn("no stack");
        assert_eq!(
            scheduler.spawn("t", Box::new(|_| {})).unwrap_err(),
            Fault::Task("no stack".into())
        );

        let handle = scheduler.spawn("t", Box::new(|_| {})).unwrap();
        scheduler.fail_next_terminate("busy");
        assert!(scheduler.terminate(handle).is_err());
        assert_eq!(scheduler.pending(), 1);
    }
}
