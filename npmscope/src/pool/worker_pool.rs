//! Fixed-size worker pool with a FIFO overflow queue.
//!
//! Each submitted task runs on its own tokio task while it holds one of the
//! pool's slots. When a slot's task finishes the slot pulls the next queued
//! task itself, so there is no central dispatcher to keep alive.
//!
//! # Example
//!
//! ```ignore
//! let pool = WorkerPool::new(10, "registry");
//! let handle = pool.submit(async { 1 + 1 });
//! assert_eq!(handle.await?, 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Default number of concurrent workers.
pub const DEFAULT_WORKER_COUNT: usize = 10;

/// Errors observed through a [`TaskHandle`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The task panicked. Its slot has been reclaimed.
    #[error("worker panicked while running task")]
    WorkerPanicked,

    /// The pool shut down before the task produced a result.
    #[error("worker pool shut down before the task completed")]
    Shutdown,
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub total_capacity: usize,
    pub available: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub peak_in_flight: usize,
    pub completed: usize,
}

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct PoolState {
    queue: VecDeque<Job>,
    in_flight: usize,
    shut_down: bool,
}

struct PoolShared {
    capacity: usize,
    label: String,
    state: Mutex<PoolState>,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
    shutdown: CancellationToken,
}

impl PoolShared {
    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }
}

/// Bounded pool of async workers.
///
/// Cloning is cheap and yields another handle to the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Creates a pool with a fixed number of slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, label: impl Into<String>) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            shared: Arc::new(PoolShared {
                capacity,
                label: label.into(),
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    in_flight: 0,
                    shut_down: false,
                }),
                peak_in_flight: AtomicUsize::new(0),
                completed: AtomicUsize::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Submits a task.
    ///
    /// The task starts immediately if a slot is free, otherwise it waits in
    /// FIFO order. Must be called from within a tokio runtime.
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = AssertUnwindSafe(task)
                .catch_unwind()
                .await
                .map_err(|_| PoolError::WorkerPanicked);
            // Receiver may have been dropped; nobody is waiting then.
            let _ = tx.send(result);
        });

        let mut state = self.shared.state.lock();
        if state.shut_down {
            trace!(pool = %self.shared.label, "Submit after shutdown");
            return TaskHandle { rx };
        }

        if state.in_flight < self.shared.capacity {
            state.in_flight += 1;
            let current = state.in_flight;
            drop(state);
            self.shared.update_peak(current);
            self.spawn_slot(job);
        } else {
            state.queue.push_back(job);
            trace!(
                pool = %self.shared.label,
                queued = state.queue.len(),
                "All slots busy, task queued"
            );
        }

        TaskHandle { rx }
    }

    fn spawn_slot(&self, first: Job) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let mut guard = SlotGuard {
                shared: Arc::clone(&shared),
                released: false,
            };
            let mut next = Some(first);

            while let Some(job) = next {
                tokio::select! {
                    biased;

                    _ = shared.shutdown.cancelled() => break,

                    _ = job => {
                        shared.completed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                next = guard.next_or_release();
            }
        });
    }

    /// Returns current occupancy.
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            total_capacity: self.shared.capacity,
            available: self.shared.capacity.saturating_sub(state.in_flight),
            in_flight: state.in_flight,
            queued: state.queue.len(),
            peak_in_flight: self.shared.peak_in_flight.load(Ordering::Relaxed),
            completed: self.shared.completed.load(Ordering::Relaxed),
        }
    }

    /// Returns the fixed slot count.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns the label for this pool.
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().shut_down
    }

    /// Discards queued tasks and aborts running ones.
    ///
    /// Outstanding handles resolve to [`PoolError::Shutdown`]. Idempotent.
    pub fn shutdown(&self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            let discarded = state.queue.len();
            state.queue.clear();
            discarded
        };
        self.shared.shutdown.cancel();

        debug!(
            pool = %self.shared.label,
            discarded,
            "Worker pool shut down"
        );
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("WorkerPool")
            .field("label", &self.shared.label)
            .field("capacity", &stats.total_capacity)
            .field("in_flight", &stats.in_flight)
            .field("queued", &stats.queued)
            .finish()
    }
}

// =============================================================================
// Slot reclamation
// =============================================================================

/// Returns a slot to the pool when its worker stops, however it stops.
struct SlotGuard {
    shared: Arc<PoolShared>,
    released: bool,
}

impl SlotGuard {
    /// Hands the slot the next queued job, or gives the slot back.
    ///
    /// The queue pop and the in-flight decrement happen under one lock so a
    /// concurrent `submit` can never see a free slot while work is queued.
    fn next_or_release(&mut self) -> Option<Job> {
        let mut state = self.shared.state.lock();
        if !state.shut_down {
            if let Some(job) = state.queue.pop_front() {
                return Some(job);
            }
        }
        state.in_flight = state.in_flight.saturating_sub(1);
        self.released = true;
        None
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mut state = self.shared.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if !state.shut_down {
            warn!(pool = %self.shared.label, "Worker slot released abnormally");
        }
    }
}

// =============================================================================
// Task handle
// =============================================================================

/// Awaitable result of a submitted task.
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Shutdown)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}
