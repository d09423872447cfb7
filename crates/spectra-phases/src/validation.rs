//! Spec content validation checks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use spectra_operation::{Operation, OperationError};

use crate::heuristics::Heuristic;

/// Sections a complete spec mentions.
pub const REQUIRED_SECTIONS: [&str; 3] = ["requirements", "acceptance", "description"];

/// The validation checks, in launch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
  EarsSyntax,
  Completeness,
  Structure,
  Consistency,
}

impl CheckKind {
  pub const ALL: [CheckKind; 4] = [
    CheckKind::EarsSyntax,
    CheckKind::Completeness,
    CheckKind::Structure,
    CheckKind::Consistency,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      CheckKind::EarsSyntax => "ears_syntax",
      CheckKind::Completeness => "completeness",
      CheckKind::Structure => "structure",
      CheckKind::Consistency => "consistency",
    }
  }
}

impl fmt::Display for CheckKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub severity: Severity,
  pub message: String,
}

/// One check over the spec content.
///
/// The payload carries `passed`; the phase succeeds only when every check
/// passed. An issue does not always fail a check: missing sections only warn.
pub struct ValidationCheck {
  id: String,
  check: CheckKind,
  content: Arc<Value>,
  text: Arc<str>,
  ears: Option<Arc<dyn Heuristic>>,
}

impl ValidationCheck {
  /// `text` is the lower-cased JSON rendering of `content`. `ears` is only
  /// consulted by [`CheckKind::EarsSyntax`].
  pub fn new(
    check: CheckKind,
    content: Arc<Value>,
    text: Arc<str>,
    ears: Option<Arc<dyn Heuristic>>,
  ) -> Self {
    Self {
      id: format!("validation_{check}"),
      check,
      content,
      text,
      ears,
    }
  }

  fn run_check(&self) -> Result<(bool, Vec<Issue>), OperationError> {
    let mut issues = Vec::new();
    let mut passed = true;

    match self.check {
      CheckKind::EarsSyntax => {
        let ears = self
          .ears
          .as_ref()
          .ok_or_else(|| OperationError::failed("no EARS heuristic registered"))?;
        if ears.scan(&self.text).is_empty() {
          issues.push(Issue {
            severity: Severity::Warning,
            message: "No EARS syntax patterns detected".to_string(),
          });
          passed = false;
        }
      }
      CheckKind::Completeness => {
        let missing: Vec<&str> = REQUIRED_SECTIONS
          .into_iter()
          .filter(|section| !self.text.contains(section))
          .collect();
        if !missing.is_empty() {
          issues.push(Issue {
            severity: Severity::Warning,
            message: format!("Missing sections: {}", missing.join(", ")),
          });
        }
      }
      CheckKind::Structure => {
        if self.content.get("id").is_none() {
          issues.push(Issue {
            severity: Severity::Error,
            message: "Missing SPEC ID".to_string(),
          });
          passed = false;
        }
      }
      CheckKind::Consistency => {}
    }

    Ok((passed, issues))
  }
}

#[async_trait]
impl Operation for ValidationCheck {
  fn id(&self) -> &str {
    &self.id
  }

  fn key(&self) -> &str {
    self.check.as_str()
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let (passed, issues) = self.run_check()?;
    let score = if passed && issues.is_empty() { 100 } else { 70 };

    Ok(json!({
      "validation_type": self.check,
      "passed": passed,
      "issues": issues,
      "score": score,
    }))
  }

  fn describe_failure(&self, reason: &str) -> String {
    format!("{} validation failed: {}", self.check, reason)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::constraints::context_text;
  use crate::heuristics::{EARS, HeuristicRegistry};
  use spectra_operation::run_operation;

  async fn check(kind: CheckKind, content: Value) -> Value {
    let text = context_text(&content);
    let ears = HeuristicRegistry::standard().get(EARS);
    let op = ValidationCheck::new(kind, Arc::new(content), text, ears);
    run_operation(&op).await.data.unwrap()
  }

  #[tokio::test]
  async fn test_ears_syntax() {
    let found = check(CheckKind::EarsSyntax, json!({"req": "The system SHALL log"})).await;
    assert_eq!(found["passed"], true);
    assert_eq!(found["score"], 100);

    let missing = check(CheckKind::EarsSyntax, json!({"req": "Log things"})).await;
    assert_eq!(missing["passed"], false);
    assert_eq!(missing["score"], 70);
    assert_eq!(missing["issues"][0]["severity"], "warning");
  }

  #[tokio::test]
  async fn test_completeness_warns_but_passes() {
    let data = check(CheckKind::Completeness, json!({"description": "x"})).await;
    assert_eq!(data["passed"], true);
    assert_eq!(data["score"], 70);
    assert_eq!(
      data["issues"][0]["message"],
      "Missing sections: requirements, acceptance"
    );
  }

  #[tokio::test]
  async fn test_structure_requires_id() {
    let data = check(CheckKind::Structure, json!({"title": "x"})).await;
    assert_eq!(data["passed"], false);
    assert_eq!(data["issues"][0]["severity"], "error");
    assert_eq!(data["validation_type"], "structure");

    let ok = check(CheckKind::Structure, json!({"id": "SPEC-001"})).await;
    assert_eq!(ok["passed"], true);
  }

  #[tokio::test]
  async fn test_consistency_always_passes() {
    let data = check(CheckKind::Consistency, json!([])).await;
    assert_eq!(data["passed"], true);
    assert_eq!(data["issues"], json!([]));
  }

  #[tokio::test]
  async fn test_failure_message() {
    let op = ValidationCheck::new(
      CheckKind::EarsSyntax,
      Arc::new(json!({})),
      context_text(&json!({})),
      None,
    );
    let result = run_operation(&op).await;
    assert_eq!(result.operation_id, "validation_ears_syntax");
    assert_eq!(
      result.error.as_deref(),
      Some("ears_syntax validation failed: no EARS heuristic registered")
    );
  }
}
