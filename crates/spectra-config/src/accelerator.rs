//! The accelerator configuration snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::env::{parse_flag, parse_var, vars};
use crate::error::ConfigError;
use crate::loader::{AcceleratorSection, ConfigFormat, read_section};

/// Default phase deadline.
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 60.0;

/// Phases that accept a `phase_timeouts` entry. The full pipeline has no
/// deadline of its own; each of its phases uses its own.
pub const PHASE_TIMEOUT_KEYS: [&str; 4] = [
  "document-loading",
  "codebase-exploration",
  "constraint-extraction",
  "validation",
];

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for one accelerator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorConfig {
  /// Project root; every other path is relative to it.
  pub project_root: PathBuf,
  pub config_yaml_path: PathBuf,
  pub config_json_path: PathBuf,
  /// Directory holding the project documents.
  pub project_docs_path: PathBuf,
  /// Directory holding `SPEC-*` folders.
  pub specs_path: PathBuf,
  pub timeout_seconds: f64,
  /// Recorded for reporting; the parallel path is attempted once.
  pub max_retries: u32,
  /// Size of the blocking worker pool.
  pub max_concurrent_tasks: usize,
  pub enable_fallback: bool,
  /// File names under `project_docs_path`, loaded in this order.
  pub document_files: Vec<String>,
  /// Per-phase deadlines in seconds, keyed by phase name.
  #[serde(default)]
  pub phase_timeouts: BTreeMap<String, f64>,
}

impl AcceleratorConfig {
  /// Built-in defaults for a project rooted at `project_root`.
  pub fn new(project_root: impl Into<PathBuf>) -> Self {
    Self {
      project_root: project_root.into(),
      config_yaml_path: PathBuf::from(".moai/config/config.yaml"),
      config_json_path: PathBuf::from(".moai/config/config.json"),
      project_docs_path: PathBuf::from(".moai/project"),
      specs_path: PathBuf::from(".moai/specs"),
      timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
      max_retries: DEFAULT_MAX_RETRIES,
      max_concurrent_tasks: DEFAULT_MAX_CONCURRENT,
      enable_fallback: true,
      document_files: vec![
        "product.md".to_string(),
        "structure.md".to_string(),
        "tech.md".to_string(),
      ],
      phase_timeouts: BTreeMap::new(),
    }
  }

  /// Defaults, then the project's YAML and JSON config files, then the
  /// process environment.
  ///
  /// Never fails: a file that cannot be read or parsed is logged and skipped.
  pub fn load_from_project(project_root: impl Into<PathBuf>) -> Self {
    Self::load_from_project_with(project_root, |var| std::env::var(var).ok())
  }

  /// [`load_from_project`](Self::load_from_project) with `lookup` in place of
  /// the process environment.
  pub fn load_from_project_with<L>(project_root: impl Into<PathBuf>, lookup: L) -> Self
  where
    L: Fn(&str) -> Option<String>,
  {
    let mut config = Self::new(project_root);

    let files = [
      (config.project_root.join(&config.config_yaml_path), ConfigFormat::Yaml),
      (config.project_root.join(&config.config_json_path), ConfigFormat::Json),
    ];
    for (path, format) in files {
      match read_section(&path, format) {
        Ok(Some(section)) => {
          debug!(path = %path.display(), "applying config file");
          config.apply_section(&section);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "skipping unreadable config file"),
      }
    }

    config.apply_env_overrides_with(lookup);
    config
  }

  /// Apply a `spec_accelerator` section. Out-of-range values are logged and
  /// skipped.
  pub fn apply_section(&mut self, section: &AcceleratorSection) {
    if let Some(timeout) = section.timeout {
      self.set_timeout(timeout, "timeout");
    }
    if let Some(retries) = section.max_retries {
      self.max_retries = retries;
    }
    if let Some(max_concurrent) = section.max_concurrent {
      self.set_max_concurrent(max_concurrent, "max_concurrent");
    }
    if let Some(enabled) = section.enable_fallback {
      self.enable_fallback = enabled;
    }
    for (phase, seconds) in &section.phase_timeouts {
      if !PHASE_TIMEOUT_KEYS.contains(&phase.as_str()) {
        warn!(phase = %phase, "ignoring timeout for unknown phase");
      } else if valid_seconds(*seconds) {
        self.phase_timeouts.insert(phase.clone(), *seconds);
      } else {
        warn!(phase = %phase, seconds, "ignoring invalid phase timeout");
      }
    }
  }

  /// Apply `SPEC_ACCELERATOR_*` overrides, using `lookup` to resolve variables.
  ///
  /// Empty values are treated as unset; unparseable values keep the current
  /// setting.
  pub fn apply_env_overrides_with<L>(&mut self, lookup: L)
  where
    L: Fn(&str) -> Option<String>,
  {
    if let Some(timeout) = parse_var::<f64, _>(&lookup, vars::TIMEOUT) {
      self.set_timeout(timeout, vars::TIMEOUT);
    }
    if let Some(retries) = parse_var::<u32, _>(&lookup, vars::MAX_RETRIES) {
      self.max_retries = retries;
    }
    if let Some(max_concurrent) = parse_var::<usize, _>(&lookup, vars::MAX_CONCURRENT) {
      self.set_max_concurrent(max_concurrent, vars::MAX_CONCURRENT);
    }
    if let Some(enabled) = parse_flag(&lookup, vars::FALLBACK) {
      self.enable_fallback = enabled;
    }
  }

  /// Project-relative document paths, in load order.
  pub fn document_paths(&self) -> Vec<String> {
    self
      .document_files
      .iter()
      .map(|name| self.document_path(name))
      .collect()
  }

  /// Project-relative path of one document.
  pub fn document_path(&self, name: &str) -> String {
    relative_string(&self.project_docs_path.join(name))
  }

  /// Deadline for `phase`, falling back to the global timeout.
  pub fn timeout_for(&self, phase: &str) -> Duration {
    let seconds = self
      .phase_timeouts
      .get(phase)
      .copied()
      .unwrap_or(self.timeout_seconds);
    Duration::try_from_secs_f64(seconds)
      .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS))
  }

  /// Check value ranges. Used after CLI flags are applied on top.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !valid_seconds(self.timeout_seconds) {
      return Err(ConfigError::InvalidValue {
        key: "timeout".to_string(),
        message: format!("must be a positive number of seconds, got {}", self.timeout_seconds),
      });
    }
    if self.max_concurrent_tasks == 0 {
      return Err(ConfigError::InvalidValue {
        key: "max_concurrent".to_string(),
        message: "must be at least 1".to_string(),
      });
    }
    if let Some(phase) = self
      .phase_timeouts
      .keys()
      .find(|phase| !PHASE_TIMEOUT_KEYS.contains(&phase.as_str()))
    {
      return Err(ConfigError::InvalidValue {
        key: format!("phase_timeouts.{phase}"),
        message: format!("unknown phase, expected one of: {}", PHASE_TIMEOUT_KEYS.join(", ")),
      });
    }
    if let Some((phase, seconds)) = self.phase_timeouts.iter().find(|(_, s)| !valid_seconds(**s)) {
      return Err(ConfigError::InvalidValue {
        key: format!("phase_timeouts.{phase}"),
        message: format!("must be a positive number of seconds, got {seconds}"),
      });
    }
    Ok(())
  }

  fn set_timeout(&mut self, seconds: f64, source: &str) {
    if valid_seconds(seconds) {
      self.timeout_seconds = seconds;
    } else {
      warn!(source, seconds, "ignoring invalid timeout");
    }
  }

  fn set_max_concurrent(&mut self, value: usize, source: &str) {
    if value > 0 {
      self.max_concurrent_tasks = value;
    } else {
      warn!(source, "ignoring max_concurrent of 0");
    }
  }
}

impl Default for AcceleratorConfig {
  fn default() -> Self {
    Self::new(".")
  }
}

fn valid_seconds(seconds: f64) -> bool {
  seconds.is_finite() && seconds > 0.0
}

/// Forward-slash rendering so document ids are stable across platforms.
fn relative_string(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  #[test]
  fn test_defaults() {
    let config = AcceleratorConfig::new("/tmp/project");
    assert_eq!(config.timeout_seconds, 60.0);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.max_concurrent_tasks, 4);
    assert!(config.enable_fallback);
    assert_eq!(
      config.document_paths(),
      vec![
        ".moai/project/product.md",
        ".moai/project/structure.md",
        ".moai/project/tech.md",
      ]
    );
    assert!(config.validate().is_ok());
  }

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn test_load_json_overrides_yaml() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(
      dir.path(),
      ".moai/config/config.yaml",
      "spec_accelerator:\n  timeout: 10\n  max_retries: 5\n  phase_timeouts:\n    validation: 4\n",
    );
    write(
      dir.path(),
      ".moai/config/config.json",
      r#"{"spec_accelerator": {"timeout": 20, "enable_fallback": false}}"#,
    );

    let config = AcceleratorConfig::load_from_project_with(dir.path(), no_env);

    assert_eq!(config.timeout_seconds, 20.0);
    assert_eq!(config.max_retries, 5);
    assert!(!config.enable_fallback);
    assert_eq!(config.timeout_for("validation"), Duration::from_secs(4));
    assert_eq!(config.max_concurrent_tasks, 4);
  }

  #[test]
  fn test_load_malformed_yaml_keeps_defaults() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), ".moai/config/config.yaml", "spec_accelerator: [unclosed\n");

    let config = AcceleratorConfig::load_from_project_with(dir.path(), no_env);

    assert_eq!(config, AcceleratorConfig::new(dir.path()));
  }

  #[test]
  fn test_load_malformed_yaml_still_applies_json() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(dir.path(), ".moai/config/config.yaml", "spec_accelerator: [unclosed\n");
    write(
      dir.path(),
      ".moai/config/config.json",
      r#"{"spec_accelerator": {"max_concurrent": 2}}"#,
    );

    let config = AcceleratorConfig::load_from_project_with(dir.path(), no_env);

    assert_eq!(config.max_concurrent_tasks, 2);
    assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
  }

  #[test]
  fn test_load_env_overrides_files() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write(
      dir.path(),
      ".moai/config/config.yaml",
      "spec_accelerator:\n  timeout: 10\n  enable_fallback: true\n",
    );
    write(
      dir.path(),
      ".moai/config/config.json",
      r#"{"spec_accelerator": {"timeout": 20, "max_concurrent": 2}}"#,
    );

    let config = AcceleratorConfig::load_from_project_with(dir.path(), |var| match var {
      vars::TIMEOUT => Some("30".to_string()),
      vars::FALLBACK => Some("false".to_string()),
      _ => None,
    });

    assert_eq!(config.timeout_seconds, 30.0);
    assert!(!config.enable_fallback);
    assert_eq!(config.max_concurrent_tasks, 2);
  }

  #[test]
  fn test_load_without_config_files() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = AcceleratorConfig::load_from_project_with(dir.path(), no_env);
    assert_eq!(config, AcceleratorConfig::new(dir.path()));
  }

  #[test]
  fn test_env_overrides() {
    let mut config = AcceleratorConfig::default();
    config.apply_env_overrides_with(|var| match var {
      vars::TIMEOUT => Some("1.5".to_string()),
      vars::MAX_RETRIES => Some("not-a-number".to_string()),
      vars::MAX_CONCURRENT => Some("8".to_string()),
      vars::FALLBACK => Some("False".to_string()),
      _ => None,
    });

    assert_eq!(config.timeout_seconds, 1.5);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.max_concurrent_tasks, 8);
    assert!(!config.enable_fallback);
  }

  #[test]
  fn test_invalid_section_values_are_skipped() {
    let mut config = AcceleratorConfig::default();
    let mut section = AcceleratorSection {
      timeout: Some(-1.0),
      max_concurrent: Some(0),
      ..Default::default()
    };
    section.phase_timeouts.insert("validation".to_string(), 0.0);
    section.phase_timeouts.insert("full".to_string(), 90.0);
    section.phase_timeouts.insert("codebase-exploration".to_string(), 90.0);
    config.apply_section(&section);

    assert_eq!(config.timeout_seconds, 60.0);
    assert_eq!(config.max_concurrent_tasks, 4);
    assert!(!config.phase_timeouts.contains_key("validation"));
    assert!(!config.phase_timeouts.contains_key("full"));
    assert_eq!(config.timeout_for("codebase-exploration"), Duration::from_secs(90));
    assert_eq!(config.timeout_for("validation"), Duration::from_secs(60));
  }

  #[test]
  fn test_validate_rejects_zero_concurrency() {
    let config = AcceleratorConfig {
      max_concurrent_tasks: 0,
      ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "max_concurrent"));
  }

  #[test]
  fn test_validate_rejects_unknown_phase_timeout() {
    let mut config = AcceleratorConfig::default();
    config.phase_timeouts.insert("full".to_string(), 90.0);
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "phase_timeouts.full"));

    config.phase_timeouts.clear();
    config.phase_timeouts.insert("validation".to_string(), 5.0);
    assert!(config.validate().is_ok());
  }
}
