use std::sync::Arc;

use serde_json::Value;
use spectra_config::AcceleratorConfig;
use spectra_operation::{DocumentStore, FsDocumentStore, Operation, WorkerPool};
use spectra_runtime::{Phase, PhaseKind, PhaseProvider, SuccessRule};
use tracing::debug;

use crate::constraints::{CONSTRAINT_TYPES, ExtractConstraint, context_text};
use crate::documents::LoadDocument;
use crate::exploration::{DependencyCheck, FileSearch, PatternAnalysis, SpecScan};
use crate::heuristics::{EARS, HeuristicRegistry};
use crate::validation::{CheckKind, ValidationCheck};

/// The stock phase batches over a project directory.
///
/// | Phase | Operations | Succeeds when |
/// |---|---|---|
/// | document loading | one per configured document | every document loaded |
/// | codebase exploration | spec scan, pattern analysis, dependency check, file search | any operation succeeded |
/// | constraint extraction | one per constraint type | every extraction succeeded |
/// | validation | one per check | every check ran and passed |
///
/// Owns the worker pool shared by every blocking operation. The pool is
/// sized from `max_concurrent_tasks` and closed when the provider drops.
pub struct StandardPhases {
  config: AcceleratorConfig,
  pool: WorkerPool,
  store: Arc<dyn DocumentStore>,
  heuristics: Arc<HeuristicRegistry>,
}

impl StandardPhases {
  pub fn new(config: &AcceleratorConfig) -> Self {
    let pool = WorkerPool::new(config.max_concurrent_tasks);
    let store = FsDocumentStore::new(config.project_root.clone(), pool.clone());
    Self {
      config: config.clone(),
      pool,
      store: Arc::new(store),
      heuristics: Arc::new(HeuristicRegistry::standard()),
    }
  }

  /// Read documents and manifests from `store` instead of the project root.
  pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
    self.store = store;
    self
  }

  pub fn with_heuristics(mut self, heuristics: HeuristicRegistry) -> Self {
    self.heuristics = Arc::new(heuristics);
    self
  }

  pub fn pool(&self) -> &WorkerPool {
    &self.pool
  }

  pub fn heuristics(&self) -> &HeuristicRegistry {
    &self.heuristics
  }
}

impl PhaseProvider for StandardPhases {
  fn document_loading(&self) -> Phase {
    let operations = self.config.document_paths().into_iter().map(|path| {
      Arc::new(LoadDocument::new(path, self.store.clone())) as Arc<dyn Operation>
    });

    Phase::new(PhaseKind::DocumentLoading)
      .nested("documents")
      .with_operations(operations)
  }

  fn codebase_exploration(&self, query: &str) -> Phase {
    let root = &self.config.project_root;
    debug!(query, root = %root.display(), "building exploration batch");

    Phase::new(PhaseKind::CodebaseExploration)
      .with_rule(SuccessRule::AnySucceeded)
      .with_operation(SpecScan::new(
        root.clone(),
        self.config.specs_path.clone(),
        self.pool.clone(),
      ))
      .with_operation(PatternAnalysis::new(root.clone(), self.pool.clone()))
      .with_operation(DependencyCheck::new(self.store.clone()))
      .with_operation(FileSearch::new(root.clone(), query, self.pool.clone()))
  }

  fn constraint_extraction(&self, context: &Value) -> Phase {
    let text = context_text(context);
    let operations = CONSTRAINT_TYPES.into_iter().map(|constraint_type| {
      Arc::new(ExtractConstraint::new(
        constraint_type,
        self.heuristics.get(constraint_type),
        text.clone(),
      )) as Arc<dyn Operation>
    });

    Phase::new(PhaseKind::ConstraintExtraction)
      .nested("constraints")
      .with_operations(operations)
  }

  fn validation(&self, content: &Value) -> Phase {
    let text = context_text(content);
    let content = Arc::new(content.clone());
    let ears = self.heuristics.get(EARS);
    let operations = CheckKind::ALL.into_iter().map(|check| {
      Arc::new(ValidationCheck::new(
        check,
        content.clone(),
        text.clone(),
        ears.clone(),
      )) as Arc<dyn Operation>
    });

    Phase::new(PhaseKind::Validation)
      .nested("validations")
      .with_rule(SuccessRule::all_passed("passed"))
      .with_verdict("all_passed")
      .with_operations(operations)
  }
}

impl Drop for StandardPhases {
  fn drop(&mut self) {
    self.pool.close();
  }
}
