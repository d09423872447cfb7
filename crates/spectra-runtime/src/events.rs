//! Pipeline events and notifiers.
//!
//! The accelerator emits events as phases start and finish so callers can
//! stream progress or record timings without parsing logs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::PhaseKind;

/// Events emitted while the accelerator runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineEvent {
  /// The full pipeline has started.
  PipelineStarted { spec_title: String },

  /// A phase has started.
  PhaseStarted { phase: PhaseKind },

  /// A phase has finished, successfully or not.
  PhaseCompleted {
    phase: PhaseKind,
    success: bool,
    tasks: usize,
    errors: usize,
    execution_time_seconds: f64,
  },

  /// The pipeline stopped early; later phases were not run.
  PipelineAborted { reason: String },

  /// The full pipeline has finished.
  PipelineCompleted { success: bool },
}

/// Receives pipeline events.
///
/// The accelerator calls `notify` inline, so implementations should not block.
pub trait PipelineNotifier: Send + Sync {
  fn notify(&self, event: PipelineEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl PipelineNotifier for NoopNotifier {
  fn notify(&self, _event: PipelineEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded: at most a handful of events per run.
  sender: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<PipelineEvent>) -> Self {
    Self { sender }
  }
}

impl PipelineNotifier for ChannelNotifier {
  fn notify(&self, event: PipelineEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
