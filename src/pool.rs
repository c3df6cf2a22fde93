//! Bounded worker pool. Runs one task per item on at most `workers` threads and returns the
//! outcomes in item order, whatever order the tasks finish in.
//!
//! No cancellation or timeout: a task that never returns keeps its worker busy and the
//! run waits for it.

use std::sync::{mpsc, Mutex};
use std::thread;
use tracing::debug;

/// Default number of concurrent tasks.
pub const DEFAULT_WORKERS: usize = 50;

/// Progress callback: (finished, total).
pub type Progress<'a> = &'a (dyn Fn(usize, usize) + Sync);

#[derive(Debug, Clone, Copy)]
pub struct ExtractionPool {
    workers: usize,
}

impl Default for ExtractionPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl ExtractionPool {
    /// Pool running at most `workers` tasks at once (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task(index, item)` for every item. Slot `i` of the result holds the outcome for
    /// `items[i]`. Tasks must handle their own failures; one task's result never affects another.
    pub fn run<T, R, F>(&self, items: &[T], task: F, progress: Option<Progress<'_>>) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let (job_tx, job_rx) = mpsc::channel::<usize>();
        for index in 0..total {
            // Receiver is alive until the scope below ends.
            let _ = job_tx.send(index);
        }
        drop(job_tx);
        let job_rx = Mutex::new(job_rx);

        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let threads = self.workers.min(total);
        debug!(threads, total, "Starting worker pool");

        thread::scope(|scope| {
            let (result_tx, result_rx) = mpsc::channel::<(usize, R)>();
            for _ in 0..threads {
                let result_tx = result_tx.clone();
                let job_rx = &job_rx;
                let task = &task;
                scope.spawn(move || loop {
                    let next = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok(index) = next else {
                        break;
                    };
                    let outcome = task(index, &items[index]);
                    if result_tx.send((index, outcome)).is_err() {
                        break;
                    }
                });
            }
            drop(result_tx);

            let mut finished = 0usize;
            for (index, outcome) in result_rx {
                slots[index] = Some(outcome);
                finished += 1;
                if let Some(report) = progress {
                    report(finished, total);
                }
            }
        });

        // Every slot is filled unless a task panicked, in which case the scope re-raised it.
        slots.into_iter().flatten().collect()
    }
}
