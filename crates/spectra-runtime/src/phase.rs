//! The phase runner.
//!
//! A [`Phase`] is a fixed, ordered list of independent operations. Running it
//! launches every operation at once, waits for all of them (one failure never
//! cancels a sibling), and folds the per-operation results into one
//! [`PhaseResult`] whose slots follow launch order.

use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{Map, Value};
use spectra_operation::{Operation, OperationResult, panic_message, run_operation};
use tokio_util::task::AbortOnDropHandle;
use tracing::{info, instrument, warn};

use crate::result::{PhaseKind, PhaseResult};

/// Predicate over a phase's per-operation results.
pub type SuccessPredicate = Arc<dyn Fn(&[OperationResult]) -> bool + Send + Sync>;

/// How a phase decides overall success.
#[derive(Clone, Default)]
pub enum SuccessRule {
  /// Every operation succeeded.
  #[default]
  AllSucceeded,
  /// At least one operation succeeded, or there were none.
  AnySucceeded,
  /// Every operation succeeded and every payload has `flag == true`.
  AllPassed { flag: String },
  Custom(SuccessPredicate),
}

impl SuccessRule {
  pub fn all_passed(flag: impl Into<String>) -> Self {
    SuccessRule::AllPassed { flag: flag.into() }
  }

  pub fn custom<F>(predicate: F) -> Self
  where
    F: Fn(&[OperationResult]) -> bool + Send + Sync + 'static,
  {
    SuccessRule::Custom(Arc::new(predicate))
  }

  pub fn evaluate(&self, results: &[OperationResult]) -> bool {
    match self {
      SuccessRule::AllSucceeded => results.iter().all(|r| r.success),
      SuccessRule::AnySucceeded => results.is_empty() || results.iter().any(|r| r.success),
      SuccessRule::AllPassed { flag } => results.iter().all(|r| {
        r.success
          && r
            .data
            .as_ref()
            .and_then(|d| d.get(flag))
            .and_then(Value::as_bool)
            .unwrap_or(false)
      }),
      SuccessRule::Custom(predicate) => predicate(results),
    }
  }
}

impl fmt::Debug for SuccessRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SuccessRule::AllSucceeded => f.write_str("AllSucceeded"),
      SuccessRule::AnySucceeded => f.write_str("AnySucceeded"),
      SuccessRule::AllPassed { flag } => f.debug_struct("AllPassed").field("flag", flag).finish(),
      SuccessRule::Custom(_) => f.write_str("Custom(..)"),
    }
  }
}

/// Where payloads land in [`PhaseResult::data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DataLayout {
  /// `data[key] = payload`
  #[default]
  Flat,
  /// `data[name][key] = payload`
  Nested(String),
}

/// A named batch of independent operations sharing a success rule.
#[derive(Clone)]
pub struct Phase {
  kind: PhaseKind,
  operations: Vec<Arc<dyn Operation>>,
  layout: DataLayout,
  rule: SuccessRule,
  verdict_key: Option<String>,
}

impl Phase {
  pub fn new(kind: PhaseKind) -> Self {
    Self {
      kind,
      operations: Vec::new(),
      layout: DataLayout::Flat,
      rule: SuccessRule::AllSucceeded,
      verdict_key: None,
    }
  }

  /// Append an operation. Launch order is insertion order.
  pub fn with_operation(mut self, operation: impl Operation + 'static) -> Self {
    self.operations.push(Arc::new(operation));
    self
  }

  /// Append already-shared operations.
  pub fn with_operations<I>(mut self, operations: I) -> Self
  where
    I: IntoIterator<Item = Arc<dyn Operation>>,
  {
    self.operations.extend(operations);
    self
  }

  /// Store payloads under `data[name]` instead of at the top level.
  pub fn nested(mut self, name: impl Into<String>) -> Self {
    self.layout = DataLayout::Nested(name.into());
    self
  }

  pub fn with_rule(mut self, rule: SuccessRule) -> Self {
    self.rule = rule;
    self
  }

  /// Also write the success verdict into `data[key]` as a boolean.
  pub fn with_verdict(mut self, key: impl Into<String>) -> Self {
    self.verdict_key = Some(key.into());
    self
  }

  pub fn kind(&self) -> PhaseKind {
    self.kind
  }

  /// Number of operations launched by a run.
  pub fn operation_count(&self) -> usize {
    self.operations.len()
  }

  /// Run every operation concurrently and wait for all of them.
  ///
  /// Each operation runs in its own task. A panicking operation fills its own
  /// slot with an error and leaves its siblings alone. Dropping the returned
  /// future aborts every task still in flight.
  #[instrument(name = "phase_run", skip(self), fields(phase = %self.kind, tasks = self.operations.len()))]
  pub async fn run(&self) -> PhaseResult {
    let start = Instant::now();

    let handles: Vec<_> = self
      .operations
      .iter()
      .map(|operation| {
        let operation = operation.clone();
        AbortOnDropHandle::new(tokio::spawn(async move {
          run_operation(operation.as_ref()).await
        }))
      })
      .collect();

    let joined = futures::future::join_all(handles).await;

    let results = joined
      .into_iter()
      .zip(&self.operations)
      .map(|(joined, operation)| match joined {
        Ok(result) => result,
        Err(e) => {
          let reason = if e.is_panic() {
            panic_message(e.into_panic())
          } else {
            "task cancelled".to_string()
          };
          OperationResult::failed(
            operation.id(),
            operation.describe_failure(&reason),
            start.elapsed().as_secs_f64() * 1000.0,
          )
        }
      })
      .collect();

    self.assemble(results, start.elapsed())
  }

  /// Run the same operations one after another on the current task.
  ///
  /// Produces the same result shape as [`Phase::run`] without spawning.
  #[instrument(name = "phase_run_sequential", skip(self), fields(phase = %self.kind, tasks = self.operations.len()))]
  pub async fn run_sequential(&self) -> PhaseResult {
    let start = Instant::now();
    let mut results = Vec::with_capacity(self.operations.len());

    for operation in &self.operations {
      let op_start = Instant::now();
      let result = match AssertUnwindSafe(run_operation(operation.as_ref()))
        .catch_unwind()
        .await
      {
        Ok(result) => result,
        Err(payload) => OperationResult::failed(
          operation.id(),
          operation.describe_failure(&panic_message(payload)),
          op_start.elapsed().as_secs_f64() * 1000.0,
        ),
      };
      results.push(result);
    }

    self.assemble(results, start.elapsed())
  }

  /// Fold per-operation results, given in launch order, into a phase result.
  ///
  /// Expects exactly one result per operation and distinct operation keys.
  pub(crate) fn assemble(&self, results: Vec<OperationResult>, elapsed: Duration) -> PhaseResult {
    debug_assert_eq!(
      self.operations.len(),
      results.len(),
      "one result per operation in {} phase",
      self.kind
    );
    debug_assert!(
      self.has_unique_keys(),
      "duplicate operation keys in {} phase",
      self.kind
    );

    let mut payloads = Map::new();
    let mut errors = Vec::new();

    for (operation, result) in self.operations.iter().zip(&results) {
      match result.outcome() {
        Ok(payload) => {
          info!(
            phase = %self.kind,
            operation_id = %result.operation_id,
            elapsed_ms = result.execution_time_ms,
            "operation_completed"
          );
          payloads.insert(operation.key().to_string(), payload.clone());
        }
        Err(error) => {
          warn!(
            phase = %self.kind,
            operation_id = %result.operation_id,
            error,
            "operation_failed"
          );
          errors.push(error.to_string());
        }
      }
    }

    let success = self.rule.evaluate(&results);

    let mut data = match &self.layout {
      DataLayout::Flat => payloads,
      DataLayout::Nested(name) => {
        let mut data = Map::new();
        data.insert(name.clone(), Value::Object(payloads));
        data
      }
    };
    if let Some(key) = &self.verdict_key {
      data.insert(key.clone(), Value::Bool(success));
    }

    info!(
      phase = %self.kind,
      tasks = results.len(),
      errors = errors.len(),
      success,
      "phase_completed"
    );

    PhaseResult {
      success,
      phase: self.kind,
      data,
      execution_time_seconds: elapsed.as_secs_f64(),
      parallel_tasks_count: self.operations.len(),
      errors,
    }
  }
}

impl Phase {
  fn has_unique_keys(&self) -> bool {
    let mut seen = HashSet::new();
    self.operations.iter().all(|op| seen.insert(op.key()))
  }
}

impl fmt::Debug for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ids: Vec<&str> = self.operations.iter().map(|op| op.id()).collect();
    f.debug_struct("Phase")
      .field("kind", &self.kind)
      .field("operations", &ids)
      .field("layout", &self.layout)
      .field("rule", &self.rule)
      .field("verdict_key", &self.verdict_key)
      .finish()
  }
}
