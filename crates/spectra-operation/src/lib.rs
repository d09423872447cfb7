//! Spectra Operation
//!
//! This crate contains the leaf building blocks of the spectra accelerator:
//!
//! - [`Operation`]: a named asynchronous unit of work that yields a JSON payload
//!   or an [`OperationError`]. Failures are values, never panics.
//! - [`OperationResult`]: the immutable record of one operation run.
//! - [`WorkerPool`]: a bounded pool for blocking I/O, owned by whoever builds the
//!   operations and injected into them.
//! - [`DocumentStore`]: path-addressed text blobs, with a filesystem
//!   implementation backed by the pool and an in-memory one for tests.
//!
//! Higher layers (`spectra-runtime`) group operations into phases and run them
//! concurrently.

mod error;
mod operation;
mod pool;
mod result;
mod store;

pub use error::{OperationError, PoolError};
pub use operation::{Operation, run_operation};
pub use pool::{DEFAULT_POOL_SIZE, WorkerPool, panic_message};
pub use result::OperationResult;
pub use store::{DocumentStore, FsDocumentStore, MemoryDocumentStore};
