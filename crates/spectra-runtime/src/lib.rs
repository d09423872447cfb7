//! Spectra Runtime
//!
//! Concurrent execution of phases and the end-to-end pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Accelerator                          │
//! │  - run_phase(kind, args) → PhaseResult                      │
//! │  - full pipeline: documents → exploration → constraints     │
//! │  - emits PipelineEvents to a PipelineNotifier               │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FallbackController                       │
//! │  - deadline on the parallel path                            │
//! │  - sequential rerun when the parallel path is unusable      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Phase                              │
//! │  - spawns every Operation, joins all, never short-circuits  │
//! │  - folds results into a PhaseResult in launch order         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Which operations make up each phase is decided by a [`PhaseProvider`].

mod accelerator;
mod error;
mod events;
mod fallback;
mod phase;
mod result;

pub use accelerator::{ABORT_MESSAGE, Accelerator, PhaseArgs, PhaseProvider};
pub use error::RuntimeError;
pub use events::{ChannelNotifier, NoopNotifier, PipelineEvent, PipelineNotifier};
pub use fallback::FallbackController;
pub use phase::{DataLayout, Phase, SuccessPredicate, SuccessRule};
pub use result::{PhaseKind, PhaseOutcome, PhaseResult};
