//! Project config file parsing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File format of a project config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
  Yaml,
  Json,
}

/// The `spec_accelerator` section of a project config file.
///
/// Every key is optional; absent keys leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorSection {
  /// Phase deadline in seconds.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_retries: Option<u32>,
  /// Size of the blocking worker pool.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_concurrent: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enable_fallback: Option<bool>,
  /// Per-phase deadlines in seconds, keyed by phase name.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub phase_timeouts: BTreeMap<String, f64>,
}

/// Whole-file shape. Other top-level keys belong to other tools and are ignored.
#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
  #[serde(default)]
  spec_accelerator: Option<AcceleratorSection>,
}

/// Parse the `spec_accelerator` section out of config file content.
///
/// `origin` names the source in error messages. Returns `Ok(None)` when the
/// content is empty or has no such section.
pub fn parse_section(
  content: &str,
  format: ConfigFormat,
  origin: &str,
) -> Result<Option<AcceleratorSection>, ConfigError> {
  if content.trim().is_empty() {
    return Ok(None);
  }

  let file: Option<ProjectFile> = match format {
    ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml {
      origin: origin.to_string(),
      message: e.to_string(),
    })?,
    ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::Json {
      origin: origin.to_string(),
      message: e.to_string(),
    })?,
  };

  Ok(file.and_then(|f| f.spec_accelerator))
}

/// Read and parse a config file. A missing file is `Ok(None)`.
pub fn read_section(
  path: &Path,
  format: ConfigFormat,
) -> Result<Option<AcceleratorSection>, ConfigError> {
  if !path.is_file() {
    return Ok(None);
  }

  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  parse_section(&content, format, &path.display().to_string())
}
