//! Bounded concurrency: the worker pool that runs one round of calls, and
//! the lazy sequencer that feeds it one round at a time.

mod pool;
mod rounds;

pub use pool::{OperationPanicked, WorkerPool};
pub use rounds::{split_rounds, Rounds};
