//! Constraint extraction.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use spectra_operation::{Operation, OperationError};

use crate::heuristics::Heuristic;

/// Constraint types extracted by default, in launch order.
pub const CONSTRAINT_TYPES: [&str; 4] = ["performance", "security", "compatibility", "scalability"];

/// One extracted constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
  pub requirement: String,
  pub source: String,
  pub confidence: String,
  pub priority: String,
}

impl Constraint {
  fn from_keyword(keyword: &str) -> Self {
    Self {
      requirement: format!("Consider {keyword} requirements"),
      source: "context_analysis".to_string(),
      confidence: "medium".to_string(),
      priority: "preferred".to_string(),
    }
  }
}

/// Runs the heuristic registered for one constraint type over the context.
pub struct ExtractConstraint {
  id: String,
  constraint_type: String,
  heuristic: Option<Arc<dyn Heuristic>>,
  context: Arc<str>,
}

impl ExtractConstraint {
  /// `heuristic` is `None` when nothing is registered for the type; the
  /// operation then fails.
  pub fn new(
    constraint_type: impl Into<String>,
    heuristic: Option<Arc<dyn Heuristic>>,
    context: Arc<str>,
  ) -> Self {
    let constraint_type = constraint_type.into();
    Self {
      id: format!("constraint_{constraint_type}"),
      constraint_type,
      heuristic,
      context,
    }
  }
}

#[async_trait]
impl Operation for ExtractConstraint {
  fn id(&self) -> &str {
    &self.id
  }

  fn key(&self) -> &str {
    &self.constraint_type
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let heuristic = self.heuristic.as_ref().ok_or_else(|| {
      OperationError::failed(format!("no heuristic registered for {}", self.constraint_type))
    })?;

    let constraints: Vec<Constraint> = heuristic
      .scan(&self.context)
      .iter()
      .map(|finding| Constraint::from_keyword(&finding.keyword))
      .collect();

    Ok(json!({
      "constraint_type": self.constraint_type,
      "constraints": constraints,
    }))
  }

  fn describe_failure(&self, reason: &str) -> String {
    format!("{} extraction failed: {}", self.constraint_type, reason)
  }
}

/// Lower-cased JSON rendering of an analysis context, shared by every
/// extraction in a phase.
pub fn context_text(context: &Value) -> Arc<str> {
  context.to_string().to_lowercase().into()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::heuristics::{HeuristicRegistry, KeywordHeuristic};
  use spectra_operation::run_operation;

  #[tokio::test]
  async fn test_security_constraints() {
    let registry = HeuristicRegistry::standard();
    let context = context_text(&json!({"title": "OAuth login with Password reset"}));
    let op = ExtractConstraint::new("security", registry.get("security"), context);

    let result = run_operation(&op).await;

    assert_eq!(result.operation_id, "constraint_security");
    assert_eq!(
      result.data.unwrap(),
      json!({
        "constraint_type": "security",
        "constraints": [
          {
            "requirement": "Consider auth requirements",
            "source": "context_analysis",
            "confidence": "medium",
            "priority": "preferred",
          },
          {
            "requirement": "Consider password requirements",
            "source": "context_analysis",
            "confidence": "medium",
            "priority": "preferred",
          },
        ],
      })
    );
  }

  #[tokio::test]
  async fn test_no_matches_is_success() {
    let op = ExtractConstraint::new(
      "scalability",
      Some(Arc::new(KeywordHeuristic::new("scalability", ["scale"]))),
      context_text(&json!({})),
    );
    let data = run_operation(&op).await.data.unwrap();
    assert_eq!(data["constraints"], json!([]));
  }

  #[tokio::test]
  async fn test_unregistered_type_fails() {
    let op = ExtractConstraint::new("privacy", None, context_text(&json!({})));
    let result = run_operation(&op).await;
    assert_eq!(
      result.error.as_deref(),
      Some("privacy extraction failed: no heuristic registered for privacy")
    );
  }
}
