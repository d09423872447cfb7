//! The pipeline orchestrator.

use std::time::Instant;

use serde_json::{Map, Value, json};
use spectra_config::AcceleratorConfig;
use tracing::{error, info, instrument};

use crate::error::RuntimeError;
use crate::events::{NoopNotifier, PipelineEvent, PipelineNotifier};
use crate::fallback::FallbackController;
use crate::phase::Phase;
use crate::result::{PhaseKind, PhaseResult};

/// Error line that leads an aborted pipeline's errors.
pub const ABORT_MESSAGE: &str = "Document loading failed completely";

/// Caller-supplied inputs for a phase run.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseArgs {
  /// Free-text query for codebase exploration.
  pub query: String,
  /// Title threaded through the full pipeline.
  pub spec_title: String,
  /// Analysis context for constraint extraction.
  pub context: Value,
  /// Document under validation.
  pub content: Value,
}

impl Default for PhaseArgs {
  fn default() -> Self {
    Self {
      query: String::new(),
      spec_title: String::new(),
      context: json!({}),
      content: json!({}),
    }
  }
}

/// Builds the operation batches for each phase.
pub trait PhaseProvider: Send + Sync {
  fn document_loading(&self) -> Phase;

  fn codebase_exploration(&self, query: &str) -> Phase;

  fn constraint_extraction(&self, context: &Value) -> Phase;

  fn validation(&self, content: &Value) -> Phase;

  /// The batch for a single runnable phase. `None` for `full` and
  /// `aggregated`, which are not single batches.
  fn phase_for(&self, kind: PhaseKind, args: &PhaseArgs) -> Option<Phase> {
    match kind {
      PhaseKind::DocumentLoading => Some(self.document_loading()),
      PhaseKind::CodebaseExploration => Some(self.codebase_exploration(&args.query)),
      PhaseKind::ConstraintExtraction => Some(self.constraint_extraction(&args.context)),
      PhaseKind::Validation => Some(self.validation(&args.content)),
      PhaseKind::Full | PhaseKind::Aggregated => None,
    }
  }
}

/// Runs single phases and the full pipeline.
///
/// Generic over `N: PipelineNotifier`. Use `Accelerator::new()` to discard
/// events, or `Accelerator::with_notifier()` to observe them.
pub struct Accelerator<P: PhaseProvider, N: PipelineNotifier = NoopNotifier> {
  config: AcceleratorConfig,
  provider: P,
  fallback: FallbackController,
  notifier: N,
}

impl<P: PhaseProvider> Accelerator<P, NoopNotifier> {
  pub fn new(config: AcceleratorConfig, provider: P) -> Result<Self, RuntimeError> {
    Self::with_notifier(config, provider, NoopNotifier)
  }
}

impl<P: PhaseProvider, N: PipelineNotifier> Accelerator<P, N> {
  /// Create an accelerator. Fails if the configuration is out of range.
  pub fn with_notifier(
    config: AcceleratorConfig,
    provider: P,
    notifier: N,
  ) -> Result<Self, RuntimeError> {
    config.validate()?;
    let fallback = FallbackController::from_config(&config);

    Ok(Self {
      config,
      provider,
      fallback,
      notifier,
    })
  }

  pub fn config(&self) -> &AcceleratorConfig {
    &self.config
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  pub fn fallback(&self) -> &FallbackController {
    &self.fallback
  }

  /// Run one phase by kind.
  ///
  /// `full` runs the pipeline. `aggregated` is not runnable and yields a
  /// failed result naming the valid phases.
  pub async fn run_phase(&self, kind: PhaseKind, args: &PhaseArgs) -> PhaseResult {
    if kind == PhaseKind::Full {
      return self.run_full_pipeline(&args.spec_title).await;
    }

    match self.provider.phase_for(kind, args) {
      Some(phase) => self.execute(phase).await,
      None => {
        let err = RuntimeError::UnknownPhase {
          name: kind.to_string(),
          valid: PhaseKind::valid_names(),
        };
        error!(phase = %kind, error = %err, "phase_rejected");
        PhaseResult::failure(kind, vec![err.to_string()], 0.0)
      }
    }
  }

  /// Run one phase batch through the fallback policy.
  ///
  /// With fallback enabled, an unusable parallel run is redone sequentially;
  /// otherwise the parallel run is bounded by the deadline only.
  pub async fn execute(&self, phase: Phase) -> PhaseResult {
    let kind = phase.kind();
    self.notifier.notify(PipelineEvent::PhaseStarted { phase: kind });

    let controller = self
      .fallback
      .with_timeout(self.config.timeout_for(kind.as_str()));

    let result = if self.config.enable_fallback {
      controller
        .execute(kind, || phase.run(), || phase.run_sequential())
        .await
    } else {
      controller
        .execute_parallel_only(kind, || phase.run())
        .await
    };

    self.notifier.notify(PipelineEvent::PhaseCompleted {
      phase: kind,
      success: result.success,
      tasks: result.parallel_tasks_count,
      errors: result.errors.len(),
      execution_time_seconds: result.execution_time_seconds,
    });

    result
  }

  /// Documents, then exploration, then constraint extraction.
  ///
  /// Aborts after document loading only when it failed and loaded nothing.
  /// Succeeds when every phase succeeded, or when at least one document
  /// loaded and at least two of the three phases succeeded.
  #[instrument(name = "pipeline_run", skip(self))]
  pub async fn run_full_pipeline(&self, spec_title: &str) -> PhaseResult {
    let start = Instant::now();
    info!(spec_title, "pipeline_started");
    self.notifier.notify(PipelineEvent::PipelineStarted {
      spec_title: spec_title.to_string(),
    });

    let mut data = Map::new();
    let mut errors = Vec::new();

    let documents = self.execute(self.provider.document_loading()).await;
    data.insert("documents".to_string(), Value::Object(documents.data.clone()));
    errors.extend(documents.errors.iter().cloned());

    let loaded = succeeded_tasks(&documents);
    if !documents.success && loaded == 0 {
      error!(errors = documents.errors.len(), "pipeline_aborted");
      self.notifier.notify(PipelineEvent::PipelineAborted {
        reason: ABORT_MESSAGE.to_string(),
      });

      let mut abort_errors = vec![ABORT_MESSAGE.to_string()];
      abort_errors.append(&mut errors);
      return PhaseResult {
        success: false,
        phase: PhaseKind::Full,
        data,
        execution_time_seconds: start.elapsed().as_secs_f64(),
        parallel_tasks_count: documents.parallel_tasks_count,
        errors: abort_errors,
      };
    }

    let exploration = self
      .execute(self.provider.codebase_exploration(spec_title))
      .await;
    data.insert(
      "exploration".to_string(),
      Value::Object(exploration.data.clone()),
    );
    errors.extend(exploration.errors.iter().cloned());

    let context = json!({
      "title": spec_title,
      "documents": documents.data,
      "exploration": exploration.data,
    });
    let constraints = self
      .execute(self.provider.constraint_extraction(&context))
      .await;
    data.insert(
      "constraints".to_string(),
      Value::Object(constraints.data.clone()),
    );
    errors.extend(constraints.errors.iter().cloned());

    let phases = [&documents, &exploration, &constraints];
    let succeeded = phases.iter().filter(|r| r.success).count();
    let success = succeeded == phases.len() || (loaded > 0 && succeeded >= 2);
    let tasks: usize = phases.iter().map(|r| r.parallel_tasks_count).sum();

    info!(
      success,
      phases_succeeded = succeeded,
      documents_loaded = loaded,
      tasks,
      errors = errors.len(),
      "pipeline_completed"
    );
    self.notifier.notify(PipelineEvent::PipelineCompleted { success });

    PhaseResult {
      success,
      phase: PhaseKind::Full,
      data,
      execution_time_seconds: start.elapsed().as_secs_f64(),
      parallel_tasks_count: tasks,
      errors,
    }
  }
}

/// Operations that produced a payload.
fn succeeded_tasks(result: &PhaseResult) -> usize {
  result
    .parallel_tasks_count
    .saturating_sub(result.errors.len())
}
