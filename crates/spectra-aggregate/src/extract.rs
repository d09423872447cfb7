//! Typed views over merged phase data.
//!
//! Phase data can be laid out two ways: keyed by phase name (output of
//! [`ResultAggregator::merge`]) or by pipeline section (`documents`,
//! `exploration`, `constraints`, as written by the full pipeline). The
//! extractors accept both, including a full pipeline result that was itself
//! merged under `full`. Missing or mistyped keys yield empty collections.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use spectra_phases::SpecEntry;
use spectra_runtime::{PhaseKind, PhaseResult};
use tracing::warn;

use crate::aggregator::ResultAggregator;

impl ResultAggregator {
  /// Loaded documents, path to content.
  pub fn extract_documents(&self, result: &PhaseResult) -> BTreeMap<String, String> {
    section(result, PhaseKind::DocumentLoading, "documents")
      .and_then(|data| data.get("documents"))
      .and_then(Value::as_object)
      .map(|documents| {
        documents
          .iter()
          .filter_map(|(path, info)| {
            let content = info.get("content")?.as_str()?;
            Some((path.clone(), content.to_string()))
          })
          .collect()
      })
      .unwrap_or_default()
  }

  /// Existing spec entries found by the spec scan. Malformed entries are
  /// skipped.
  pub fn extract_specs(&self, result: &PhaseResult) -> Vec<SpecEntry> {
    section(result, PhaseKind::CodebaseExploration, "exploration")
      .and_then(|data| data.get("spec_scan"))
      .and_then(|scan| scan.get("existing_specs"))
      .and_then(Value::as_array)
      .map(|entries| {
        entries
          .iter()
          .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(spec) => Some(spec),
            Err(e) => {
              warn!(error = %e, "skipping malformed spec entry");
              None
            }
          })
          .collect()
      })
      .unwrap_or_default()
  }

  /// Constraint findings grouped by constraint type.
  pub fn extract_constraints(&self, result: &PhaseResult) -> BTreeMap<String, Vec<Value>> {
    section(result, PhaseKind::ConstraintExtraction, "constraints")
      .and_then(|data| data.get("constraints"))
      .and_then(Value::as_object)
      .map(|by_type| {
        by_type
          .iter()
          .filter_map(|(kind, entry)| {
            let findings = entry.get("constraints")?.as_array()?;
            Some((kind.clone(), findings.clone()))
          })
          .collect()
      })
      .unwrap_or_default()
  }
}

/// Locate one phase's data inside `result`.
fn section<'a>(
  result: &'a PhaseResult,
  phase: PhaseKind,
  pipeline_key: &str,
) -> Option<&'a Map<String, Value>> {
  if result.phase == phase {
    return Some(&result.data);
  }

  let lookup = |data: &'a Map<String, Value>| {
    data
      .get(phase.as_str())
      .or_else(|| data.get(pipeline_key))
      .and_then(Value::as_object)
  };

  match result.phase {
    PhaseKind::Full => result
      .data
      .get(pipeline_key)
      .and_then(Value::as_object),
    _ => lookup(&result.data).or_else(|| {
      result
        .data
        .get(PhaseKind::Full.as_str())
        .and_then(Value::as_object)
        .and_then(|full| full.get(pipeline_key))
        .and_then(Value::as_object)
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn spec(id: &str) -> Value {
    json!({
      "id": id,
      "path": format!(".moai/specs/{id}"),
      "has_plan": true,
      "has_acceptance": false,
    })
  }

  fn result(phase: PhaseKind, data: Value) -> PhaseResult {
    PhaseResult {
      success: true,
      phase,
      data: data.as_object().cloned().unwrap_or_default(),
      execution_time_seconds: 0.0,
      parallel_tasks_count: 1,
      errors: Vec::new(),
    }
  }

  #[test]
  fn test_documents_from_merged_result() {
    let merged = result(
      PhaseKind::Aggregated,
      json!({
        "document-loading": {
          "documents": {
            ".moai/project/product.md": {"content": "# Product", "lines": 1},
            ".moai/project/broken.md": "not a record"
          }
        }
      }),
    );

    let documents = ResultAggregator::new().extract_documents(&merged);

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[".moai/project/product.md"], "# Product");
  }

  #[test]
  fn test_documents_from_full_pipeline() {
    let full = result(
      PhaseKind::Full,
      json!({"documents": {"documents": {"tech.md": {"content": "rust"}}}}),
    );
    let documents = ResultAggregator::new().extract_documents(&full);
    assert_eq!(documents["tech.md"], "rust");
  }

  #[test]
  fn test_specs_and_constraints() {
    let merged = result(
      PhaseKind::Aggregated,
      json!({
        "codebase-exploration": {
          "spec_scan": {"existing_specs": [spec("SPEC-001"), {"id": "SPEC-BAD"}], "count": 2}
        },
        "full": {
          "constraints": {
            "constraints": {
              "security": {"constraint_type": "security", "constraints": [{"requirement": "Consider auth requirements"}]},
              "performance": {"constraint_type": "performance"}
            }
          }
        }
      }),
    );

    let aggregator = ResultAggregator::new();
    assert_eq!(
      aggregator.extract_specs(&merged),
      vec![SpecEntry {
        id: "SPEC-001".to_string(),
        path: ".moai/specs/SPEC-001".to_string(),
        has_plan: true,
        has_acceptance: false,
      }]
    );

    let constraints = aggregator.extract_constraints(&merged);
    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints["security"].len(), 1);
  }

  #[test]
  fn test_missing_keys_yield_empty() {
    let empty = result(PhaseKind::Validation, json!({}));
    let aggregator = ResultAggregator::new();
    assert!(aggregator.extract_documents(&empty).is_empty());
    assert!(aggregator.extract_specs(&empty).is_empty());
    assert!(aggregator.extract_constraints(&empty).is_empty());
  }

  #[test]
  fn test_single_phase_result() {
    let exploration = result(
      PhaseKind::CodebaseExploration,
      json!({"spec_scan": {"existing_specs": [spec("SPEC-002")]}}),
    );
    let specs = ResultAggregator::new().extract_specs(&exploration);
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].id, "SPEC-002");
    assert!(specs[0].has_plan);
  }
}
