//! Document stores.
//!
//! A [`DocumentStore`] hands out text blobs addressed by a path relative to
//! the project root. Stores are read-only from the accelerator's point of view.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::OperationError;
use crate::pool::WorkerPool;

/// Read-only, path-addressed text storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Read a document as UTF-8 text.
  ///
  /// Returns [`OperationError::NotFound`] when the document does not exist.
  async fn read(&self, path: &str) -> Result<String, OperationError>;

  /// Check whether a document exists.
  async fn exists(&self, path: &str) -> bool;
}

/// Filesystem-backed store rooted at the project directory.
///
/// Reads run on the injected [`WorkerPool`].
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
  root: PathBuf,
  pool: WorkerPool,
}

impl FsDocumentStore {
  /// Create a store rooted at `root`.
  pub fn new(root: impl Into<PathBuf>, pool: WorkerPool) -> Self {
    Self {
      root: root.into(),
      pool,
    }
  }

  /// Root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
  async fn read(&self, path: &str) -> Result<String, OperationError> {
    let full_path = self.root.join(path);
    let content = self
      .pool
      .run(move || {
        if !full_path.is_file() {
          return Ok(None);
        }
        std::fs::read_to_string(full_path).map(Some)
      })
      .await??;

    content.ok_or_else(|| OperationError::NotFound {
      path: path.to_string(),
    })
  }

  /// `false` for directories, and when the pool is closed.
  async fn exists(&self, path: &str) -> bool {
    let full_path = self.root.join(path);
    self
      .pool
      .run(move || full_path.is_file())
      .await
      .unwrap_or(false)
  }
}

/// In-memory store, mainly for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
  documents: HashMap<String, String>,
}

impl MemoryDocumentStore {
  /// Create an empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a document.
  pub fn with_document(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
    self.documents.insert(path.into(), content.into());
    self
  }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
  async fn read(&self, path: &str) -> Result<String, OperationError> {
    self
      .documents
      .get(path)
      .cloned()
      .ok_or_else(|| OperationError::NotFound {
        path: path.to_string(),
      })
  }

  async fn exists(&self, path: &str) -> bool {
    self.documents.contains_key(path)
  }
}
