#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use spectra_operation::{Operation, OperationError};

/// What a scripted operation does when run.
#[derive(Debug, Clone)]
pub enum Script {
  Succeed(Value),
  Fail(String),
  Panic(String),
}

/// An operation with a fixed delay and outcome.
pub struct Scripted {
  id: String,
  delay: Duration,
  script: Script,
  runs: Arc<AtomicUsize>,
}

impl Scripted {
  pub fn ok(id: &str) -> Self {
    Self::new(id, Script::Succeed(json!({ "id": id })))
  }

  pub fn fail(id: &str, reason: &str) -> Self {
    Self::new(id, Script::Fail(reason.to_string()))
  }

  pub fn panics(id: &str, message: &str) -> Self {
    Self::new(id, Script::Panic(message.to_string()))
  }

  pub fn new(id: &str, script: Script) -> Self {
    Self {
      id: id.to_string(),
      delay: Duration::ZERO,
      script,
      runs: Arc::new(AtomicUsize::new(0)),
    }
  }

  pub fn delayed(mut self, millis: u64) -> Self {
    self.delay = Duration::from_millis(millis);
    self
  }

  pub fn counted(mut self, runs: &Arc<AtomicUsize>) -> Self {
    self.runs = runs.clone();
    self
  }
}

#[async_trait]
impl Operation for Scripted {
  fn id(&self) -> &str {
    &self.id
  }

  async fn execute(&self) -> Result<Value, OperationError> {
    self.runs.fetch_add(1, Ordering::SeqCst);
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    match &self.script {
      Script::Succeed(value) => Ok(value.clone()),
      Script::Fail(reason) => Err(OperationError::failed(reason.clone())),
      Script::Panic(message) => panic!("{}", message),
    }
  }
}
