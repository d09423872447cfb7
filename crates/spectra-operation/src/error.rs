//! Operation error types.

use thiserror::Error;

/// Errors an operation can report for its own slot.
#[derive(Debug, Error)]
pub enum OperationError {
  /// A path-addressed resource does not exist.
  #[error("file not found: {path}")]
  NotFound { path: String },

  /// An I/O error occurred while reading a resource.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A resource could not be parsed as JSON.
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  /// The worker pool could not run the blocking part of the operation.
  #[error(transparent)]
  Pool(#[from] PoolError),

  /// Any other failure, described in plain words.
  #[error("{message}")]
  Failed { message: String },
}

impl OperationError {
  /// Create a free-form failure.
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}

/// Errors from the blocking worker pool.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
  /// The pool was closed before a worker slot became free.
  #[error("worker pool closed")]
  Closed,

  /// The blocking closure panicked.
  #[error("blocking task panicked: {message}")]
  Panicked { message: String },

  /// The blocking task was cancelled before it finished.
  #[error("blocking task cancelled")]
  Cancelled,
}
