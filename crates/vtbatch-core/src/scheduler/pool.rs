//! Bounded worker pool with a completion barrier.
//!
//! `run` executes a round of operations on at most `workers` scoped threads
//! pulling from a shared queue, and returns only once every operation has
//! finished. Results come back in input order, one per operation.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use thiserror::Error;

/// An operation panicked instead of returning; siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation {index} panicked: {message}")]
pub struct OperationPanicked {
    pub index: usize,
    pub message: String,
}

/// Fixed-size executor; `workers` is clamped to at least one.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one round. At most `workers` operations execute at any instant;
    /// the call blocks until all of them have returned (or panicked).
    pub fn run<T, F>(&self, ops: Vec<F>) -> Vec<Result<T, OperationPanicked>>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let count = ops.len();
        if count == 0 {
            return Vec::new();
        }

        let queue: Mutex<VecDeque<(usize, F)>> = Mutex::new(ops.into_iter().enumerate().collect());
        let num_workers = self.workers.min(count);
        let mut slots: Vec<Option<Result<T, OperationPanicked>>> =
            std::iter::repeat_with(|| None).take(count).collect();

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();
            for _ in 0..num_workers {
                let tx = tx.clone();
                let queue = &queue;
                s.spawn(move || loop {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some((index, op)) = next else {
                        break;
                    };
                    let res = panic::catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
                        OperationPanicked {
                            index,
                            message: panic_message(payload.as_ref()),
                        }
                    });
                    if tx.send((index, res)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);
            for (index, res) in rx {
                slots[index] = Some(res);
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    Err(OperationPanicked {
                        index,
                        message: "worker exited without a result".to_string(),
                    })
                })
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
