//! Spectra Config
//!
//! Configuration for the accelerator. A configuration is assembled once per
//! accelerator instance and then treated as a read-only snapshot.
//!
//! Layers, later ones winning:
//! 1. built-in defaults ([`AcceleratorConfig::new`])
//! 2. `.moai/config/config.yaml`, `spec_accelerator:` section
//! 3. `.moai/config/config.json`, same section
//! 4. `SPEC_ACCELERATOR_*` environment variables (see [`vars`])
//!
//! Command-line flags are applied by the binary on top of that.

mod accelerator;
mod env;
mod error;
mod loader;

pub use accelerator::{AcceleratorConfig, DEFAULT_TIMEOUT_SECONDS, PHASE_TIMEOUT_KEYS};
pub use env::vars;
pub use error::ConfigError;
pub use loader::{AcceleratorSection, ConfigFormat, parse_section, read_section};
