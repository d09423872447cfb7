//! Human-readable summaries.

use std::fmt::Write;

use serde_json::Value;
use spectra_runtime::PhaseResult;

use crate::aggregator::ResultAggregator;

impl ResultAggregator {
  /// Markdown summary: status, errors, and a per-key item count.
  pub fn generate_summary(&self, result: &PhaseResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# SPEC Accelerator Results Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Success:** {}", yes_no(result.success));
    let _ = writeln!(out, "**Phase:** {}", result.phase);
    let _ = writeln!(out, "**Tasks:** {}", result.parallel_tasks_count);
    let _ = writeln!(out, "**Time:** {:.2}s", result.execution_time_seconds);
    let _ = writeln!(out);

    if !result.errors.is_empty() {
      let _ = writeln!(out, "## Errors");
      for error in &result.errors {
        let _ = writeln!(out, "- {error}");
      }
      let _ = writeln!(out);
    }

    if !result.data.is_empty() {
      let _ = writeln!(out, "## Data Summary");
      for (key, value) in &result.data {
        match value {
          Value::Object(items) => {
            let _ = writeln!(out, "- **{key}:** {} items", items.len());
          }
          other => {
            let _ = writeln!(out, "- **{key}:** {}", type_name(other));
          }
        }
      }
    }

    out.trim_end().to_string()
  }
}

fn yes_no(flag: bool) -> &'static str {
  if flag { "Yes" } else { "No" }
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{Map, json};
  use spectra_runtime::PhaseKind;

  #[test]
  fn test_summary_layout() {
    let mut data = Map::new();
    data.insert("validations".to_string(), json!({"structure": {}, "consistency": {}}));
    data.insert("all_passed".to_string(), json!(false));
    let result = PhaseResult {
      success: false,
      phase: PhaseKind::Validation,
      data,
      execution_time_seconds: 0.0123,
      parallel_tasks_count: 4,
      errors: vec!["structure validation failed: boom".to_string()],
    };

    let summary = ResultAggregator::new().generate_summary(&result);

    assert_eq!(
      summary,
      "# SPEC Accelerator Results Summary\n\
       \n\
       **Success:** No\n\
       **Phase:** validation\n\
       **Tasks:** 4\n\
       **Time:** 0.01s\n\
       \n\
       ## Errors\n\
       - structure validation failed: boom\n\
       \n\
       ## Data Summary\n\
       - **all_passed:** bool\n\
       - **validations:** 2 items"
    );
  }

  #[test]
  fn test_summary_without_errors_or_data() {
    let result = PhaseResult {
      success: true,
      phase: PhaseKind::Validation,
      data: Map::new(),
      execution_time_seconds: 1.5,
      parallel_tasks_count: 0,
      errors: Vec::new(),
    };

    let summary = ResultAggregator::new().generate_summary(&result);

    assert!(summary.ends_with("**Time:** 1.50s"));
    assert!(!summary.contains("## Errors"));
  }
}
