//! Text heuristics.
//!
//! A [`Heuristic`] scans text and reports findings. Phases look heuristics up
//! by name in a [`HeuristicRegistry`], so the scans can be swapped out without
//! touching the operations that use them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name of the EARS requirement-syntax heuristic.
pub const EARS: &str = "ears";

/// One match reported by a heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
  pub keyword: String,
}

/// A named text scan.
pub trait Heuristic: Send + Sync {
  fn name(&self) -> &str;

  /// Findings in `text`, in the heuristic's own keyword order.
  fn scan(&self, text: &str) -> Vec<Finding>;
}

/// Case-insensitive substring scan over a fixed keyword list.
#[derive(Debug, Clone)]
pub struct KeywordHeuristic {
  name: String,
  keywords: Vec<String>,
}

impl KeywordHeuristic {
  pub fn new<I, S>(name: impl Into<String>, keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      name: name.into(),
      keywords: keywords
        .into_iter()
        .map(|k| k.into().to_lowercase())
        .collect(),
    }
  }
}

impl Heuristic for KeywordHeuristic {
  fn name(&self) -> &str {
    &self.name
  }

  fn scan(&self, text: &str) -> Vec<Finding> {
    let text = text.to_lowercase();
    self
      .keywords
      .iter()
      .filter(|keyword| text.contains(keyword.as_str()))
      .map(|keyword| Finding {
        keyword: keyword.clone(),
      })
      .collect()
  }
}

/// Heuristics by name.
#[derive(Clone, Default)]
pub struct HeuristicRegistry {
  heuristics: BTreeMap<String, Arc<dyn Heuristic>>,
}

impl HeuristicRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// The four constraint scans plus [`EARS`].
  pub fn standard() -> Self {
    let mut registry = Self::new();
    registry.register(KeywordHeuristic::new(
      "performance",
      ["latency", "throughput", "response time", "fast", "slow", "optimize"],
    ));
    registry.register(KeywordHeuristic::new(
      "security",
      ["auth", "encrypt", "secure", "password", "token", "permission"],
    ));
    registry.register(KeywordHeuristic::new(
      "compatibility",
      ["browser", "mobile", "api version", "backward", "support"],
    ));
    registry.register(KeywordHeuristic::new(
      "scalability",
      ["scale", "concurrent", "load", "capacity", "growth"],
    ));
    registry.register(KeywordHeuristic::new(
      EARS,
      ["shall", "when", "while", "where", "if"],
    ));
    registry
  }

  /// Register a heuristic under its own name, returning any it replaced.
  pub fn register(&mut self, heuristic: impl Heuristic + 'static) -> Option<Arc<dyn Heuristic>> {
    let name = heuristic.name().to_string();
    self.heuristics.insert(name, Arc::new(heuristic))
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn Heuristic>> {
    self.heuristics.get(name).cloned()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.heuristics.keys().map(String::as_str)
  }
}

impl fmt::Debug for HeuristicRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HeuristicRegistry")
      .field("heuristics", &self.heuristics.keys().collect::<Vec<_>>())
      .finish()
  }
}
