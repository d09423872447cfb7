//! Timeout and sequential fallback around a phase run.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use spectra_config::{AcceleratorConfig, DEFAULT_TIMEOUT_SECONDS};
use spectra_operation::panic_message;
use tracing::{debug, error, warn};

use crate::result::{PhaseKind, PhaseResult};

/// Bounds the parallel path of a phase by a deadline and substitutes the
/// sequential path when the parallel outcome is unusable.
///
/// The parallel path is attempted once. A result with fewer errors than
/// tasks is accepted as is; a timeout, a panic, or a result where every task
/// failed triggers the sequential path, whose result is returned
/// unconditionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackController {
  timeout: Duration,
  max_retries: u32,
}

impl FallbackController {
  pub fn new(timeout: Duration, max_retries: u32) -> Self {
    Self {
      timeout,
      max_retries,
    }
  }

  pub fn from_config(config: &AcceleratorConfig) -> Self {
    let timeout = Duration::try_from_secs_f64(config.timeout_seconds)
      .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS));
    Self::new(timeout, config.max_retries)
  }

  /// Same retry budget, different deadline.
  pub fn with_timeout(self, timeout: Duration) -> Self {
    Self { timeout, ..self }
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  /// Run `parallel` under the deadline, falling back to `sequential`.
  ///
  /// Never panics: a panicking sequential path yields a failed result.
  pub async fn execute<P, PF, S, SF>(
    &self,
    phase: PhaseKind,
    parallel: P,
    sequential: S,
  ) -> PhaseResult
  where
    P: FnOnce() -> PF,
    PF: Future<Output = PhaseResult>,
    S: FnOnce() -> SF,
    SF: Future<Output = PhaseResult>,
  {
    let start = Instant::now();

    let reason = match tokio::time::timeout(self.timeout, AssertUnwindSafe(parallel()).catch_unwind())
      .await
    {
      Ok(Ok(result)) => {
        if result.success {
          return result;
        }
        if result.parallel_tasks_count > 0 && result.errors.len() < result.parallel_tasks_count {
          debug!(
            phase = %phase,
            errors = result.errors.len(),
            tasks = result.parallel_tasks_count,
            "accepting partial result"
          );
          return result;
        }
        if result.parallel_tasks_count == 0 {
          "no tasks ran".to_string()
        } else {
          "all tasks failed".to_string()
        }
      }
      Ok(Err(payload)) => format!("parallel path panicked: {}", panic_message(payload)),
      Err(_) => format!("timed out after {}s", self.timeout.as_secs_f64()),
    };

    warn!(phase = %phase, reason = %reason, "fallback_triggered");

    match AssertUnwindSafe(sequential()).catch_unwind().await {
      Ok(result) => result,
      Err(payload) => {
        let message = format!(
          "{phase} sequential fallback panicked: {}",
          panic_message(payload)
        );
        error!(phase = %phase, error = %message, "fallback_failed");
        PhaseResult::failure(phase, vec![message], start.elapsed().as_secs_f64())
      }
    }
  }

  /// Run `parallel` under the deadline with no fallback.
  ///
  /// A timeout or panic becomes a failed result.
  pub async fn execute_parallel_only<P, PF>(&self, phase: PhaseKind, parallel: P) -> PhaseResult
  where
    P: FnOnce() -> PF,
    PF: Future<Output = PhaseResult>,
  {
    let start = Instant::now();

    match tokio::time::timeout(self.timeout, AssertUnwindSafe(parallel()).catch_unwind()).await {
      Ok(Ok(result)) => result,
      Ok(Err(payload)) => {
        let message = format!("{phase} panicked: {}", panic_message(payload));
        error!(phase = %phase, error = %message, "phase_panicked");
        PhaseResult::failure(phase, vec![message], start.elapsed().as_secs_f64())
      }
      Err(_) => {
        let message = format!("{phase} timed out after {}s", self.timeout.as_secs_f64());
        warn!(phase = %phase, error = %message, "phase_timed_out");
        PhaseResult::failure(phase, vec![message], start.elapsed().as_secs_f64())
      }
    }
  }
}

impl Default for FallbackController {
  fn default() -> Self {
    Self::from_config(&AcceleratorConfig::default())
  }
}
