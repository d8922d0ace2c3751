//! # Worker Pool
//!
//! Bounded pool executing one batch of hooks at a time.
//!
//! ```text
//!                 ┌──> worker 0 ──┐
//!   [job queue] ──┼──> worker 1 ──┼──> [result queue] ──> caller
//!    (indices)    └──> worker N ──┘     (index, outcome)
//! ```
//!
//! Workers are scoped threads spawned for the batch and joined before
//! [`WorkerPool::run`] returns, so tasks may borrow from the caller.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam_channel::unbounded;

use crate::error::{EcsError, EcsResult, FailureCause, HookResult};

/// Runs a hook, turning a returned error or a panic into a [`FailureCause`].
pub(crate) fn catch_hook<F>(hook: F) -> Result<(), FailureCause>
where
    F: FnOnce() -> HookResult,
{
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(FailureCause::Error(err)),
        Err(payload) => Err(FailureCause::Panic(panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A bounded pool of worker threads.
///
/// # Example
///
/// ```rust
/// use epsilon_core::sched::WorkerPool;
///
/// let pool = WorkerPool::new(2).unwrap();
/// let outcomes = pool.run(&[1, 2, 3], |n| {
///     if *n == 2 { Err("two".into()) } else { Ok(()) }
/// });
/// assert!(outcomes[0].is_ok());
/// assert!(outcomes[1].is_err());
/// assert!(outcomes[2].is_ok());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    size: NonZeroUsize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` tasks at a time.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `size` is zero.
    pub fn new(size: usize) -> EcsResult<Self> {
        NonZeroUsize::new(size)
            .map(|size| Self { size })
            .ok_or_else(|| EcsError::InvalidConfig("worker pool size must be at least 1".to_string()))
    }

    /// Creates a pool from a size that is already known to be non-zero.
    #[inline]
    #[must_use]
    pub const fn with_size(size: NonZeroUsize) -> Self {
        Self { size }
    }

    /// Maximum number of tasks running at the same time.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size.get()
    }

    /// Runs `task` once for every job and blocks until all of them finished.
    ///
    /// Outcomes are returned in job order. A failing or panicking task never
    /// stops the others.
    pub fn run<T, F>(&self, jobs: &[T], task: F) -> Vec<Result<(), FailureCause>>
    where
        T: Sync,
        F: Fn(&T) -> HookResult + Sync,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let (job_tx, job_rx) = unbounded::<usize>();
        let (done_tx, done_rx) = unbounded::<(usize, Result<(), FailureCause>)>();
        for index in 0..jobs.len() {
            // The receiver is alive until the scope below ends.
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let workers = self.size().min(jobs.len());
        let task = &task;
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for index in job_rx.iter() {
                        let outcome = catch_hook(|| task(&jobs[index]));
                        if done_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(done_tx);

        let mut outcomes: Vec<Option<Result<(), FailureCause>>> =
            std::iter::repeat_with(|| None).take(jobs.len()).collect();
        for (index, outcome) in done_rx.iter() {
            outcomes[index] = Some(outcome);
        }
        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| Err(FailureCause::Panic("worker exited before running the task".to_string())))
            })
            .collect()
    }
}
