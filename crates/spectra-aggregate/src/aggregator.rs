//! Cross-phase merging.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use spectra_runtime::{PhaseKind, PhaseResult};
use tracing::debug;

/// Error reported when there is nothing to merge.
pub const NO_RESULTS_MESSAGE: &str = "No results to aggregate";

/// Detailed cross-phase report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
  /// True iff no phase failed.
  pub success: bool,
  pub phases_completed: Vec<PhaseKind>,
  pub phases_failed: Vec<PhaseKind>,
  /// Phase name to that phase's data.
  pub combined_data: Map<String, Value>,
  /// Longest phase, since phases denote concurrent wall-clock spans.
  pub total_execution_time_seconds: f64,
  pub total_tasks_count: usize,
  /// Every error, prefixed with `[<phase>] `.
  pub all_errors: Vec<String>,
}

impl AggregatedResult {
  /// Data recorded for `phase`, if any.
  pub fn get_phase_data(&self, phase: PhaseKind) -> Option<&Map<String, Value>> {
    self
      .combined_data
      .get(phase.as_str())
      .and_then(Value::as_object)
  }
}

/// Merges phase results. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
  pub fn new() -> Self {
    Self
  }

  /// Shallow merge into one `aggregated` phase result.
  ///
  /// Data is keyed by phase name, last writer wins. Success is the AND of all
  /// inputs, time is the maximum, task counts are summed and errors are
  /// concatenated as is.
  pub fn merge(&self, results: &[PhaseResult]) -> PhaseResult {
    if results.is_empty() {
      return PhaseResult::failure(
        PhaseKind::Aggregated,
        vec![NO_RESULTS_MESSAGE.to_string()],
        0.0,
      );
    }

    let mut data = Map::new();
    let mut errors = Vec::new();
    let mut tasks = 0;
    let mut success = true;
    let mut time: f64 = 0.0;

    for result in results {
      data.insert(
        result.phase.as_str().to_string(),
        Value::Object(result.data.clone()),
      );
      errors.extend(result.errors.iter().cloned());
      tasks += result.parallel_tasks_count;
      success &= result.success;
      time = time.max(result.execution_time_seconds);
    }

    debug!(inputs = results.len(), tasks, errors = errors.len(), "merged phase results");

    PhaseResult {
      success,
      phase: PhaseKind::Aggregated,
      data,
      execution_time_seconds: time,
      parallel_tasks_count: tasks,
      errors,
    }
  }

  /// Merge into an [`AggregatedResult`], splitting completed and failed
  /// phases and prefixing every error with its phase.
  pub fn aggregate_detailed(&self, results: &[PhaseResult]) -> AggregatedResult {
    if results.is_empty() {
      return AggregatedResult {
        success: false,
        phases_completed: Vec::new(),
        phases_failed: Vec::new(),
        combined_data: Map::new(),
        total_execution_time_seconds: 0.0,
        total_tasks_count: 0,
        all_errors: vec![NO_RESULTS_MESSAGE.to_string()],
      };
    }

    let mut completed = Vec::new();
    let mut failed = Vec::new();
    let mut combined_data = Map::new();
    let mut all_errors = Vec::new();
    let mut tasks = 0;
    let mut time: f64 = 0.0;

    for result in results {
      if result.success {
        completed.push(result.phase);
      } else {
        failed.push(result.phase);
      }
      combined_data.insert(
        result.phase.as_str().to_string(),
        Value::Object(result.data.clone()),
      );
      all_errors.extend(
        result
          .errors
          .iter()
          .map(|e| format!("[{}] {}", result.phase, e)),
      );
      tasks += result.parallel_tasks_count;
      time = time.max(result.execution_time_seconds);
    }

    AggregatedResult {
      success: failed.is_empty(),
      phases_completed: completed,
      phases_failed: failed,
      combined_data,
      total_execution_time_seconds: time,
      total_tasks_count: tasks,
      all_errors,
    }
  }
}
