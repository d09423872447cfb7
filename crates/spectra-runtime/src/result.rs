//! Phase kinds and phase-level results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RuntimeError;

/// The fixed phase vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
  DocumentLoading,
  CodebaseExploration,
  ConstraintExtraction,
  Validation,
  /// The end-to-end pipeline.
  Full,
  /// Output of the result aggregator. Never run directly.
  Aggregated,
}

impl PhaseKind {
  /// Phases that can be requested by name.
  pub const RUNNABLE: [PhaseKind; 5] = [
    PhaseKind::DocumentLoading,
    PhaseKind::CodebaseExploration,
    PhaseKind::ConstraintExtraction,
    PhaseKind::Validation,
    PhaseKind::Full,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      PhaseKind::DocumentLoading => "document-loading",
      PhaseKind::CodebaseExploration => "codebase-exploration",
      PhaseKind::ConstraintExtraction => "constraint-extraction",
      PhaseKind::Validation => "validation",
      PhaseKind::Full => "full",
      PhaseKind::Aggregated => "aggregated",
    }
  }

  pub fn is_runnable(&self) -> bool {
    Self::RUNNABLE.contains(self)
  }

  /// Comma-separated list of runnable phase names.
  pub fn valid_names() -> String {
    Self::RUNNABLE
      .iter()
      .map(PhaseKind::as_str)
      .collect::<Vec<_>>()
      .join(", ")
  }
}

impl fmt::Display for PhaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PhaseKind {
  type Err = RuntimeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    [
      PhaseKind::DocumentLoading,
      PhaseKind::CodebaseExploration,
      PhaseKind::ConstraintExtraction,
      PhaseKind::Validation,
      PhaseKind::Full,
      PhaseKind::Aggregated,
    ]
    .into_iter()
    .find(|kind| kind.as_str() == s)
    .ok_or_else(|| RuntimeError::UnknownPhase {
      name: s.to_string(),
      valid: Self::valid_names(),
    })
  }
}

/// Coarse classification of a phase result, used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
  Success,
  /// Some but not all operations failed.
  Partial,
  Failure,
}

/// Outcome of one phase: a batch of concurrently-run operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
  pub success: bool,
  pub phase: PhaseKind,
  /// Payloads keyed by operation key, laid out per phase.
  pub data: Map<String, Value>,
  /// Wall-clock span of the whole batch.
  pub execution_time_seconds: f64,
  /// Number of operations launched.
  pub parallel_tasks_count: usize,
  /// One message per failed operation, in launch order.
  pub errors: Vec<String>,
}

impl PhaseResult {
  /// A failed result carrying only errors.
  pub fn failure(phase: PhaseKind, errors: Vec<String>, execution_time_seconds: f64) -> Self {
    Self {
      success: false,
      phase,
      data: Map::new(),
      execution_time_seconds: execution_time_seconds.max(0.0),
      parallel_tasks_count: 0,
      errors,
    }
  }

  /// Some but not all operations failed.
  pub fn is_partial(&self) -> bool {
    self.parallel_tasks_count > 0
      && !self.errors.is_empty()
      && self.errors.len() < self.parallel_tasks_count
  }

  /// Fewer errors than tasks: at least one operation produced output.
  pub fn is_usable(&self) -> bool {
    self.success || (self.parallel_tasks_count > 0 && self.errors.len() < self.parallel_tasks_count)
  }

  pub fn outcome(&self) -> PhaseOutcome {
    if self.success {
      PhaseOutcome::Success
    } else if self.is_usable() {
      PhaseOutcome::Partial
    } else {
      PhaseOutcome::Failure
    }
  }

  /// Pretty-printed JSON.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}
