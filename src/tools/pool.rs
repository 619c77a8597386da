//! Bounded pool for offloaded tool calls.

use crate::error::{RecapError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Runs tool calls on the tokio runtime, at most `capacity` at a time.
///
/// Cloning shares the same permits, so one pool can serve every run in the
/// process. When all permits are taken, callers wait for one to free up.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by a running task.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `work` on its own task once a permit is free and wait for its output.
    ///
    /// If the caller is dropped, the spawned task still finishes and its
    /// output is discarded.
    pub async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RecapError::ToolFailed(format!("Worker pool closed: {}", e)))?;
        debug!("Worker permit acquired ({} left)", self.available());

        let handle = tokio::spawn(async move {
            let output = work.await;
            drop(permit);
            output
        });

        handle
            .await
            .map_err(|e| RecapError::ToolFailed(format!("Tool task failed: {}", e)))
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_output() {
        let pool = WorkerPool::new(2);
        let value = pool.run(async { 21 * 2 }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_clamped() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_queues_instead_of_failing() {
        let pool = WorkerPool::new(1);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..4).map(|_| {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            async move {
                pool.run(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let pool = WorkerPool::new(1);
        let err = pool
            .run(async {
                panic!("boom");
            })
            .await
            .map(|_: ()| ())
            .unwrap_err();
        assert!(matches!(err, RecapError::ToolFailed(_)));
    }
}
