//! Bounded pool for blocking work.
//!
//! File reads and directory walks are blocking. They run on tokio's blocking
//! threads, but a semaphore caps how many run at once so a phase cannot flood
//! the blocking thread pool. The pool is an owned value: whoever builds the
//! operations creates one and hands clones to them.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::PoolError;

/// Default number of concurrent blocking workers.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// A cloneable handle to a bounded blocking-work pool.
#[derive(Debug, Clone)]
pub struct WorkerPool {
  permits: Arc<Semaphore>,
  size: usize,
}

impl WorkerPool {
  /// Create a pool with `size` workers. A size of zero is treated as one.
  pub fn new(size: usize) -> Self {
    let size = size.max(1);
    Self {
      permits: Arc::new(Semaphore::new(size)),
      size,
    }
  }

  /// Number of workers.
  pub fn size(&self) -> usize {
    self.size
  }

  /// Run a blocking closure on the pool and wait for its result.
  pub async fn run<F, T>(&self, f: F) -> Result<T, PoolError>
  where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
  {
    let permit = self
      .permits
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| PoolError::Closed)?;

    tokio::task::spawn_blocking(move || {
      let _permit = permit;
      f()
    })
    .await
    .map_err(|e| {
      if e.is_panic() {
        PoolError::Panicked {
          message: panic_message(e.into_panic()),
        }
      } else {
        PoolError::Cancelled
      }
    })
  }

  /// Close the pool. Pending and future `run` calls fail with
  /// [`PoolError::Closed`]; work already running finishes.
  pub fn close(&self) {
    self.permits.close();
  }
}

impl Default for WorkerPool {
  fn default() -> Self {
    Self::new(DEFAULT_POOL_SIZE)
  }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  #[tokio::test]
  async fn test_run_returns_value() {
    let pool = WorkerPool::new(1);
    let value = pool.run(|| 21 * 2).await.unwrap();
    assert_eq!(value, 42);
    assert_eq!(pool.run(|| "again").await.unwrap(), "again");
  }

  #[tokio::test]
  async fn test_zero_size_is_one() {
    assert_eq!(WorkerPool::new(0).size(), 1);
  }

  #[tokio::test]
  async fn test_panic_is_reported() {
    let pool = WorkerPool::default();
    let err = pool
      .run(|| -> u32 { panic!("disk on fire") })
      .await
      .unwrap_err();
    match err {
      PoolError::Panicked { message } => assert_eq!(message, "disk on fire"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_closed_pool_rejects_work() {
    let pool = WorkerPool::new(1);
    pool.close();
    let err = pool.run(|| ()).await.unwrap_err();
    assert!(matches!(err, PoolError::Closed));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrency_is_bounded() {
    let pool = WorkerPool::new(2);
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let jobs = (0..6).map(|_| {
      let pool = pool.clone();
      let active = active.clone();
      let peak = peak.clone();
      async move {
        pool
          .run(move || {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            active.fetch_sub(1, Ordering::SeqCst);
          })
          .await
      }
    });

    for result in futures_join(jobs).await {
      result.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
  }

  async fn futures_join<I, F, T>(jobs: I) -> Vec<T>
  where
    I: IntoIterator<Item = F>,
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
  {
    let handles: Vec<_> = jobs.into_iter().map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
      out.push(handle.await.unwrap());
    }
    out
  }
}
