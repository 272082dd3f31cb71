use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay without blocking the caller.
///
/// There is no cancel handle: tasks are expected to re-check shared state
/// when they fire and do nothing if it has moved on.
pub trait Timer: Send + Sync + 'static {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Production timer: one short-lived sleeper thread per task.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadTimer;

impl Timer for ThreadTimer {
    fn schedule(&self, delay: Duration, task: Task) {
        thread::spawn(move || {
            thread::sleep(delay);
            task();
        });
    }
}

/// Test timer: holds tasks until the test fires them explicitly.
#[derive(Default)]
pub struct ManualTimer {
    pending: Mutex<Vec<(Duration, Task)>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Delays of the queued tasks, in scheduling order.
    pub fn delays(&self) -> Vec<Duration> {
        self.lock().iter().map(|(d, _)| *d).collect()
    }

    /// Run the oldest queued task. Returns false if nothing was queued.
    pub fn fire_next(&self) -> bool {
        let next = {
            let mut pending = self.lock();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };

        match next {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run every queued task in scheduling order. Returns how many ran.
    pub fn fire_all(&self) -> usize {
        let tasks = std::mem::take(&mut *self.lock());
        let count = tasks.len();
        for (_, task) in tasks {
            task();
        }
        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Duration, Task)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, delay: Duration, task: Task) {
        self.lock().push((delay, task));
    }
}

impl<T: Timer> Timer for std::sync::Arc<T> {
    fn schedule(&self, delay: Duration, task: Task) {
        (**self).schedule(delay, task)
    }
}
