//! Bounded execution of registry fetches.
//!
//! [`WorkerPool`] limits how many tasks run at once and queues the rest in
//! submission order. [`FetchTask`] is the unit of work the resolver submits:
//! one registry resolution with its own timeout and retry policy.

mod fetch;
mod worker_pool;

pub use fetch::{FetchPolicy, FetchTask, DEFAULT_RETRY_BASE_DELAY};
pub use worker_pool::{PoolError, PoolStats, TaskHandle, WorkerPool, DEFAULT_WORKER_COUNT};
