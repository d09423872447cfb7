//! Operation result record.

use serde::{Deserialize, Serialize};

/// Outcome of a single operation run.
///
/// Exactly one of `data` and `error` is populated, according to `success`.
/// Construct through [`OperationResult::succeeded`] or
/// [`OperationResult::failed`] to keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
  /// Identifier unique within the phase (a file path or a check name).
  pub operation_id: String,
  /// Whether the operation succeeded.
  pub success: bool,
  /// Payload, present only on success.
  pub data: Option<serde_json::Value>,
  /// Human-readable failure message, present only on failure.
  pub error: Option<String>,
  /// Wall-clock time spent in the operation.
  pub execution_time_ms: f64,
}

impl OperationResult {
  /// Create a successful result.
  pub fn succeeded(
    operation_id: impl Into<String>,
    data: serde_json::Value,
    execution_time_ms: f64,
  ) -> Self {
    Self {
      operation_id: operation_id.into(),
      success: true,
      data: Some(data),
      error: None,
      execution_time_ms: execution_time_ms.max(0.0),
    }
  }

  /// Create a failed result.
  pub fn failed(
    operation_id: impl Into<String>,
    error: impl Into<String>,
    execution_time_ms: f64,
  ) -> Self {
    Self {
      operation_id: operation_id.into(),
      success: false,
      data: None,
      error: Some(error.into()),
      execution_time_ms: execution_time_ms.max(0.0),
    }
  }

  /// Tagged view of the outcome.
  pub fn outcome(&self) -> Result<&serde_json::Value, &str> {
    match (&self.data, &self.error) {
      (Some(data), None) if self.success => Ok(data),
      (_, Some(error)) => Err(error.as_str()),
      _ => Err("operation produced no payload"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_succeeded_populates_data_only() {
    let result = OperationResult::succeeded("spec_scan", json!({"count": 2}), 1.5);
    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(result.outcome(), Ok(&json!({"count": 2})));
  }

  #[test]
  fn test_failed_populates_error_only() {
    let result = OperationResult::failed("tech.md", "file not found: tech.md", 0.2);
    assert!(!result.success);
    assert_eq!(result.data, None);
    assert_eq!(result.outcome(), Err("file not found: tech.md"));
  }

  #[test]
  fn test_negative_time_is_clamped() {
    let result = OperationResult::succeeded("a", json!(null), -3.0);
    assert_eq!(result.execution_time_ms, 0.0);
  }
}
