//! Codebase exploration.
//!
//! Every operation here only reads the project tree. Directory walks are
//! blocking and run on the injected [`WorkerPool`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use spectra_operation::{DocumentStore, Operation, OperationError, WorkerPool};
use walkdir::WalkDir;

/// Source extensions counted by the pattern analysis.
pub const SOURCE_EXTENSIONS: [&str; 5] = [".ts", ".tsx", ".py", ".js", ".jsx"];

/// Directories searched for files related to a query.
pub const SEARCH_DIRS: [&str; 3] = ["src", "server", "tests"];

/// Maximum number of related files reported.
pub const MAX_RELATED_FILES: usize = 20;

/// A `SPEC-*` folder holding a `spec.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
  pub id: String,
  pub path: String,
  pub has_plan: bool,
  pub has_acceptance: bool,
}

/// Lists existing specs under the specs directory.
pub struct SpecScan {
  root: PathBuf,
  specs_path: PathBuf,
  pool: WorkerPool,
}

impl SpecScan {
  pub fn new(root: impl Into<PathBuf>, specs_path: impl Into<PathBuf>, pool: WorkerPool) -> Self {
    Self {
      root: root.into(),
      specs_path: specs_path.into(),
      pool,
    }
  }
}

#[async_trait]
impl Operation for SpecScan {
  fn id(&self) -> &str {
    "spec_scan"
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let root = self.root.clone();
    let specs_path = self.specs_path.clone();
    let specs = self
      .pool
      .run(move || scan_specs(&root, &specs_path))
      .await??;

    Ok(json!({
      "count": specs.len(),
      "existing_specs": specs,
    }))
  }
}

fn scan_specs(root: &Path, specs_path: &Path) -> io::Result<Vec<SpecEntry>> {
  let specs_dir = root.join(specs_path);
  if !specs_dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut specs = Vec::new();
  for entry in std::fs::read_dir(&specs_dir)? {
    let entry = entry?;
    let id = entry.file_name().to_string_lossy().into_owned();
    let dir = entry.path();
    if !dir.is_dir() || !id.starts_with("SPEC-") || !dir.join("spec.md").is_file() {
      continue;
    }

    specs.push(SpecEntry {
      path: slash_path(&specs_path.join(&id).join("spec.md")),
      has_plan: dir.join("plan.md").exists(),
      has_acceptance: dir.join("acceptance.md").exists(),
      id,
    });
  }

  specs.sort_by(|a, b| a.id.cmp(&b.id));
  Ok(specs)
}

/// Source file distribution and layout conventions under `src/`.
pub struct PatternAnalysis {
  root: PathBuf,
  pool: WorkerPool,
}

impl PatternAnalysis {
  pub fn new(root: impl Into<PathBuf>, pool: WorkerPool) -> Self {
    Self {
      root: root.into(),
      pool,
    }
  }
}

#[async_trait]
impl Operation for PatternAnalysis {
  fn id(&self) -> &str {
    "pattern_analysis"
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let src = self.root.join("src");
    let patterns = self.pool.run(move || analyze_patterns(&src)).await?;
    Ok(json!({ "patterns": patterns }))
  }
}

fn analyze_patterns(src: &Path) -> Vec<Value> {
  if !src.is_dir() {
    return Vec::new();
  }

  let mut counts = Map::new();
  for ext in SOURCE_EXTENSIONS {
    let count = WalkDir::new(src)
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_name().to_string_lossy().ends_with(ext))
      .count();
    if count > 0 {
      counts.insert(ext.to_string(), json!(count));
    }
  }

  let mut patterns = vec![json!({"type": "file_distribution", "data": counts})];
  if src.join("components").exists() {
    patterns.push(json!({"type": "component_architecture", "detected": true}));
  }
  if src.join("services").exists() {
    patterns.push(json!({"type": "service_layer", "detected": true}));
  }
  if src.join("store").exists() || src.join("stores").exists() {
    patterns.push(json!({"type": "state_management", "detected": true}));
  }
  patterns
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  dependencies: Map<String, Value>,
  #[serde(default, rename = "devDependencies")]
  dev_dependencies: Map<String, Value>,
}

/// Summarizes `package.json` and `requirements.txt` when present.
pub struct DependencyCheck {
  store: Arc<dyn DocumentStore>,
}

impl DependencyCheck {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }
}

#[async_trait]
impl Operation for DependencyCheck {
  fn id(&self) -> &str {
    "dependency_check"
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let mut dependencies = Map::new();

    if self.store.exists("package.json").await {
      let manifest: PackageManifest = serde_json::from_str(&self.store.read("package.json").await?)?;
      dependencies.insert(
        "node".to_string(),
        json!({
          "name": manifest.name.unwrap_or_else(|| "unknown".to_string()),
          "dependencies": manifest.dependencies.len(),
          "devDependencies": manifest.dev_dependencies.len(),
        }),
      );
    }

    if self.store.exists("requirements.txt").await {
      let content = self.store.read("requirements.txt").await?;
      let packages = content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .count();
      dependencies.insert("python".to_string(), json!({ "packages": packages }));
    }

    Ok(json!({ "dependencies": dependencies }))
  }
}

/// A file whose name contains a query keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedFile {
  pub path: String,
  pub keyword: String,
  pub relevance: String,
}

/// Finds files whose names contain any word of the query.
pub struct FileSearch {
  root: PathBuf,
  query: String,
  pool: WorkerPool,
}

impl FileSearch {
  pub fn new(root: impl Into<PathBuf>, query: impl Into<String>, pool: WorkerPool) -> Self {
    Self {
      root: root.into(),
      query: query.into(),
      pool,
    }
  }
}

#[async_trait]
impl Operation for FileSearch {
  fn id(&self) -> &str {
    "file_search"
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let root = self.root.clone();
    let keywords: Vec<String> = self
      .query
      .to_lowercase()
      .split_whitespace()
      .map(str::to_string)
      .collect();

    let related = self
      .pool
      .run(move || search_files(&root, &keywords))
      .await?;
    Ok(json!({ "related_files": related }))
  }
}

fn search_files(root: &Path, keywords: &[String]) -> Vec<RelatedFile> {
  let mut related = Vec::new();
  if keywords.is_empty() {
    return related;
  }

  for dir in SEARCH_DIRS {
    let walker = WalkDir::new(root.join(dir))
      .sort_by_file_name()
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().is_file());

    for entry in walker {
      let name = entry.file_name().to_string_lossy().to_lowercase();
      let Some(keyword) = keywords.iter().find(|k| name.contains(k.as_str())) else {
        continue;
      };
      let path = entry.path().strip_prefix(root).unwrap_or(entry.path());
      related.push(RelatedFile {
        path: slash_path(path),
        keyword: keyword.clone(),
        relevance: "medium".to_string(),
      });
      if related.len() == MAX_RELATED_FILES {
        return related;
      }
    }
  }

  related
}

/// Forward-slash rendering of a relative path.
fn slash_path(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
