//! Task execution for per-instrument valuation.
//!
//! Two backends with identical results: a rayon worker pool and strictly
//! sequential in-thread execution. The backend is chosen once per
//! calibration run. If the pool cannot be built the executor falls back to
//! inline execution.

use std::fmt::Display;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Executes a batch of independent tasks and returns their results in input
/// order.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::TaskExecutor;
///
/// let items = [1, 2, 3, 4];
/// let pooled = TaskExecutor::worker_pool(Some(2)).map_ordered(&items, |x| x * 10);
/// let inline = TaskExecutor::Inline.map_ordered(&items, |x| x * 10);
/// assert_eq!(pooled, vec![10, 20, 30, 40]);
/// assert_eq!(pooled, inline);
/// ```
#[derive(Debug, Clone)]
pub enum TaskExecutor {
    /// Dedicated rayon pool.
    WorkerPool(Arc<ThreadPool>),
    /// Sequential execution on the calling thread.
    Inline,
}

impl TaskExecutor {
    /// Build a worker pool of `num_threads` workers (rayon's default when
    /// `None`), falling back to [`TaskExecutor::Inline`] on failure.
    pub fn worker_pool(num_threads: Option<usize>) -> Self {
        let result = ThreadPoolBuilder::new()
            .num_threads(num_threads.unwrap_or(0))
            .thread_name(|i| format!("calibration-{}", i))
            .build();
        Self::from_pool_result(result)
    }

    fn from_pool_result<E: Display>(result: Result<ThreadPool, E>) -> Self {
        match result {
            Ok(pool) => {
                tracing::debug!(threads = pool.current_num_threads(), "built valuation worker pool");
                TaskExecutor::WorkerPool(Arc::new(pool))
            }
            Err(e) => {
                tracing::warn!(error = %e, "valuation worker pool unavailable, valuing instruments inline");
                TaskExecutor::Inline
            }
        }
    }

    /// Whether tasks run on the calling thread.
    pub fn is_inline(&self) -> bool {
        matches!(self, TaskExecutor::Inline)
    }

    /// Apply `task` to every item, blocking until all have completed.
    ///
    /// Results are in the order of `items` regardless of completion order.
    pub fn map_ordered<T, R, F>(&self, items: &[T], task: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            TaskExecutor::WorkerPool(pool) => pool.install(|| items.par_iter().map(&task).collect()),
            TaskExecutor::Inline => items.iter().map(&task).collect(),
        }
    }
}
