//! Runtime errors.

use spectra_config::ConfigError;

/// Errors raised outside of phase execution.
///
/// Failures inside a phase are never errors; they are reported in
/// [`PhaseResult::errors`](crate::PhaseResult::errors).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// A phase name outside the known vocabulary.
  #[error("Unknown phase: {name}. Valid phases: {valid}")]
  UnknownPhase { name: String, valid: String },

  /// The configuration snapshot failed validation.
  #[error(transparent)]
  Config(#[from] ConfigError),
}
