//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The config file exists but could not be read.
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The YAML config file is malformed.
  #[error("invalid YAML in {origin}: {message}")]
  Yaml { origin: String, message: String },

  /// The JSON config file is malformed.
  #[error("invalid JSON in {origin}: {message}")]
  Json { origin: String, message: String },

  /// A value is outside its allowed range.
  #[error("invalid value for {key}: {message}")]
  InvalidValue { key: String, message: String },
}
