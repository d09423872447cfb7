//! The operation contract.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::OperationError;
use crate::result::OperationResult;

/// A named, independent unit of asynchronous work.
///
/// Operations own everything they need (shared read-only context behind
/// `Arc`s) and never mutate state outside their own result, so any number of
/// them can run concurrently.
#[async_trait]
pub trait Operation: Send + Sync {
  /// Identifier unique within the phase.
  fn id(&self) -> &str;

  /// Key under which the payload is stored in the phase data.
  ///
  /// Defaults to [`Operation::id`].
  fn key(&self) -> &str {
    self.id()
  }

  /// Run the operation and return its payload.
  async fn execute(&self) -> Result<serde_json::Value, OperationError>;

  /// Render the phase-level error line for a failure of this operation.
  fn describe_failure(&self, reason: &str) -> String {
    format!("{} failed: {}", self.key(), reason)
  }
}

/// Run an operation, timing it and folding its outcome into a result record.
#[instrument(name = "operation_run", skip(operation), fields(operation_id = %operation.id()))]
pub async fn run_operation(operation: &dyn Operation) -> OperationResult {
  let start = Instant::now();
  let outcome = operation.execute().await;
  let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

  match outcome {
    Ok(data) => {
      debug!(elapsed_ms, "operation succeeded");
      OperationResult::succeeded(operation.id(), data, elapsed_ms)
    }
    Err(e) => {
      debug!(elapsed_ms, error = %e, "operation failed");
      OperationResult::failed(
        operation.id(),
        operation.describe_failure(&e.to_string()),
        elapsed_ms,
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  struct Echo;

  #[async_trait]
  impl Operation for Echo {
    fn id(&self) -> &str {
      "echo"
    }

    async fn execute(&self) -> Result<serde_json::Value, OperationError> {
      Ok(json!({"echo": true}))
    }
  }

  struct Broken;

  #[async_trait]
  impl Operation for Broken {
    fn id(&self) -> &str {
      "validation_structure"
    }

    fn key(&self) -> &str {
      "structure"
    }

    async fn execute(&self) -> Result<serde_json::Value, OperationError> {
      Err(OperationError::failed("missing id"))
    }
  }

  #[tokio::test]
  async fn test_run_operation_success() {
    let result = run_operation(&Echo).await;
    assert!(result.success);
    assert_eq!(result.operation_id, "echo");
    assert_eq!(result.data, Some(json!({"echo": true})));
  }

  #[tokio::test]
  async fn test_run_operation_failure_uses_key_in_message() {
    let result = run_operation(&Broken).await;
    assert!(!result.success);
    assert_eq!(result.operation_id, "validation_structure");
    assert_eq!(result.error.as_deref(), Some("structure failed: missing id"));
  }
}
