mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use spectra_runtime::{FallbackController, Phase, PhaseKind};

use common::Scripted;

fn controller(timeout_ms: u64) -> FallbackController {
  FallbackController::new(Duration::from_millis(timeout_ms), 3)
}

#[tokio::test]
async fn test_partial_result_is_returned_unchanged() {
  let phase = Phase::new(PhaseKind::DocumentLoading)
    .with_operation(Scripted::ok("product.md"))
    .with_operation(Scripted::fail("tech.md", "missing"));
  let sequential_calls = AtomicUsize::new(0);

  let expected = phase.run().await;
  let result = controller(1_000)
    .execute(
      PhaseKind::DocumentLoading,
      || phase.run(),
      || {
        sequential_calls.fetch_add(1, Ordering::SeqCst);
        phase.run_sequential()
      },
    )
    .await;

  assert_eq!(sequential_calls.load(Ordering::SeqCst), 0);
  assert_eq!(result.data, expected.data);
  assert_eq!(result.errors, expected.errors);
  assert!(!result.success);
}

#[tokio::test]
async fn test_total_failure_returns_sequential_result() {
  let parallel = Phase::new(PhaseKind::DocumentLoading)
    .with_operation(Scripted::fail("product.md", "parallel broke"))
    .with_operation(Scripted::fail("tech.md", "parallel broke"));
  let sequential = Phase::new(PhaseKind::DocumentLoading)
    .with_operation(Scripted::ok("product.md"))
    .with_operation(Scripted::fail("tech.md", "missing"));
  let sequential_calls = AtomicUsize::new(0);

  let alone = sequential.run_sequential().await;
  let result = controller(1_000)
    .execute(
      PhaseKind::DocumentLoading,
      || parallel.run(),
      || {
        sequential_calls.fetch_add(1, Ordering::SeqCst);
        sequential.run_sequential()
      },
    )
    .await;

  assert_eq!(sequential_calls.load(Ordering::SeqCst), 1);
  assert_eq!(result.data, alone.data);
  assert_eq!(result.errors, alone.errors);
  assert_eq!(result.success, alone.success);
}

#[tokio::test]
async fn test_timeout_triggers_sequential_path() {
  let slow_runs = Arc::new(AtomicUsize::new(0));
  let slow = Phase::new(PhaseKind::CodebaseExploration)
    .with_operation(Scripted::ok("spec_scan").delayed(5_000).counted(&slow_runs));
  let fast = Phase::new(PhaseKind::CodebaseExploration).with_operation(Scripted::ok("spec_scan"));

  let result = controller(50)
    .execute(
      PhaseKind::CodebaseExploration,
      || slow.run(),
      || fast.run_sequential(),
    )
    .await;

  assert!(result.success);
  assert!(result.errors.is_empty());
  assert_eq!(slow_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_full_success_skips_sequential_path() {
  let runs = Arc::new(AtomicUsize::new(0));
  let phase = Phase::new(PhaseKind::Validation)
    .with_operation(Scripted::ok("structure").counted(&runs))
    .with_operation(Scripted::ok("consistency").counted(&runs));

  let result = controller(1_000)
    .execute(PhaseKind::Validation, || phase.run(), || phase.run_sequential())
    .await;

  assert!(result.success);
  assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_tasks_failure_falls_back() {
  let sequential_calls = AtomicUsize::new(0);

  let result = controller(1_000)
    .execute(
      PhaseKind::Validation,
      || async { spectra_runtime::PhaseResult::failure(PhaseKind::Validation, vec![], 0.0) },
      || {
        sequential_calls.fetch_add(1, Ordering::SeqCst);
        async { Phase::new(PhaseKind::Validation).run_sequential().await }
      },
    )
    .await;

  assert_eq!(sequential_calls.load(Ordering::SeqCst), 1);
  assert!(result.success);
}

#[tokio::test]
async fn test_parallel_only_keeps_total_failure() {
  let phase = Phase::new(PhaseKind::DocumentLoading)
    .with_operation(Scripted::fail("product.md", "missing"));

  let result = controller(1_000)
    .execute_parallel_only(PhaseKind::DocumentLoading, || phase.run())
    .await;

  assert!(!result.success);
  assert_eq!(result.errors, vec!["product.md failed: missing".to_string()]);
}
