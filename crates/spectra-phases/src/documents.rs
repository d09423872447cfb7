//! Project document loading.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use spectra_operation::{DocumentStore, Operation, OperationError};

use crate::markdown::extract_sections;

/// Loads one document from the store and splits it into sections.
///
/// The operation id is the document path, which is also its key under
/// `data.documents`.
pub struct LoadDocument {
  path: String,
  store: Arc<dyn DocumentStore>,
}

impl LoadDocument {
  pub fn new(path: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
    Self {
      path: path.into(),
      store,
    }
  }
}

#[async_trait]
impl Operation for LoadDocument {
  fn id(&self) -> &str {
    &self.path
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    let content = self.store.read(&self.path).await?;
    let lines = content.lines().count();
    let sections = extract_sections(content.lines());

    Ok(json!({
      "path": self.path,
      "size_bytes": content.len(),
      "lines": lines,
      "sections": sections,
      "content": content,
    }))
  }

  fn describe_failure(&self, reason: &str) -> String {
    format!("Failed to load {}: {}", self.path, reason)
  }
}
