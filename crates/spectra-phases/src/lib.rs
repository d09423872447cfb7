//! Spectra Phases
//!
//! The stock operations behind each phase, and [`StandardPhases`], the
//! [`PhaseProvider`](spectra_runtime::PhaseProvider) that batches them:
//!
//! - document loading: one [`LoadDocument`] per configured project document
//! - codebase exploration: [`SpecScan`], [`PatternAnalysis`],
//!   [`DependencyCheck`] and [`FileSearch`]
//! - constraint extraction: one [`ExtractConstraint`] per constraint type
//! - validation: one [`ValidationCheck`] per [`CheckKind`]
//!
//! Keyword scans are looked up by name in a [`HeuristicRegistry`].

mod constraints;
mod documents;
mod exploration;
mod heuristics;
mod markdown;
mod provider;
mod validation;

pub use constraints::{CONSTRAINT_TYPES, Constraint, ExtractConstraint, context_text};
pub use documents::LoadDocument;
pub use exploration::{
  DependencyCheck, FileSearch, MAX_RELATED_FILES, PatternAnalysis, RelatedFile, SEARCH_DIRS,
  SOURCE_EXTENSIONS, SpecEntry, SpecScan,
};
pub use heuristics::{EARS, Finding, Heuristic, HeuristicRegistry, KeywordHeuristic};
pub use markdown::{Section, extract_sections};
pub use provider::StandardPhases;
pub use validation::{CheckKind, Issue, REQUIRED_SECTIONS, Severity, ValidationCheck};
