use std::fmt::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::{Value, json};
use tracing::{debug, warn};

use spectra_aggregate::ResultAggregator;
use spectra_config::AcceleratorConfig;
use spectra_phases::StandardPhases;
use spectra_runtime::{Accelerator, PhaseArgs, PhaseKind, PhaseOutcome, PhaseResult};

/// Number of errors listed by the text output.
const TEXT_ERROR_LIMIT: usize = 5;

/// Exit code when no phase ran, e.g. on invalid configuration.
const ERROR_EXIT: u8 = 2;

/// Spectra - parallel phase runner for SPEC authoring
#[derive(Parser)]
#[command(name = "spectra")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Phase to run
  #[arg(long, value_enum)]
  phase: PhaseArg,

  /// Project root directory
  #[arg(long, default_value = ".")]
  project_root: PathBuf,

  /// Search query for codebase exploration
  #[arg(long, default_value = "")]
  query: String,

  /// SPEC title for the full pipeline
  #[arg(long, default_value = "")]
  spec_title: String,

  /// Analysis context for constraint extraction (JSON)
  #[arg(long, default_value = "{}")]
  context: String,

  /// SPEC content for validation (JSON)
  #[arg(long, default_value = "{}")]
  content: String,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
  output: OutputFormat,

  /// Phase deadline in seconds, overriding config and environment
  #[arg(long)]
  timeout: Option<f64>,

  /// Worker pool size, overriding config and environment
  #[arg(long)]
  max_concurrent: Option<usize>,

  /// Disable the sequential fallback
  #[arg(long)]
  no_fallback: bool,

  /// Enable debug logging
  #[arg(long, short)]
  verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PhaseArg {
  DocumentLoading,
  CodebaseExploration,
  ConstraintExtraction,
  Validation,
  Full,
}

impl From<PhaseArg> for PhaseKind {
  fn from(phase: PhaseArg) -> Self {
    match phase {
      PhaseArg::DocumentLoading => PhaseKind::DocumentLoading,
      PhaseArg::CodebaseExploration => PhaseKind::CodebaseExploration,
      PhaseArg::ConstraintExtraction => PhaseKind::ConstraintExtraction,
      PhaseArg::Validation => PhaseKind::Validation,
      PhaseArg::Full => PhaseKind::Full,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
  Json,
  Text,
  Summary,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  ExitCode::from(exit_code_for(try_main(&cli)))
}

fn try_main(cli: &Cli) -> Result<PhaseOutcome> {
  let config = load_config(cli)?;
  debug!(
    project_root = %config.project_root.display(),
    phase = ?cli.phase,
    "starting"
  );

  let args = PhaseArgs {
    query: cli.query.clone(),
    spec_title: cli.spec_title.clone(),
    context: parse_json_arg("context", &cli.context),
    content: parse_json_arg("content", &cli.content),
  };

  let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
  let result = rt.block_on(run(config, cli.phase.into(), args))?;

  println!("{}", format_result(&result, cli.output)?);
  Ok(result.outcome())
}

async fn run(config: AcceleratorConfig, kind: PhaseKind, args: PhaseArgs) -> Result<PhaseResult> {
  let phases = StandardPhases::new(&config);
  let accelerator = Accelerator::new(config, phases).context("failed to create accelerator")?;
  Ok(accelerator.run_phase(kind, &args).await)
}

fn init_tracing(verbose: bool) {
  use tracing_subscriber::{EnvFilter, fmt, prelude::*};

  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn load_config(cli: &Cli) -> Result<AcceleratorConfig> {
  let mut config = AcceleratorConfig::load_from_project(cli.project_root.clone());
  if let Some(timeout) = cli.timeout {
    config.timeout_seconds = timeout;
  }
  if let Some(max_concurrent) = cli.max_concurrent {
    config.max_concurrent_tasks = max_concurrent;
  }
  if cli.no_fallback {
    config.enable_fallback = false;
  }
  config.validate().context("invalid configuration")?;
  Ok(config)
}

/// Parse a JSON flag, falling back to `{}` when it is malformed.
fn parse_json_arg(name: &str, raw: &str) -> Value {
  serde_json::from_str(raw).unwrap_or_else(|e| {
    warn!(arg = name, error = %e, "invalid JSON argument, using {{}}");
    json!({})
  })
}

fn format_result(result: &PhaseResult, output: OutputFormat) -> Result<String> {
  match output {
    OutputFormat::Json => result.to_json().context("failed to serialize result"),
    OutputFormat::Text => Ok(format_text(result)),
    OutputFormat::Summary => Ok(ResultAggregator::new().generate_summary(result)),
  }
}

fn format_text(result: &PhaseResult) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Phase: {}", result.phase);
  let _ = writeln!(out, "Success: {}", if result.success { "Yes" } else { "No" });
  let _ = writeln!(out, "Parallel Tasks: {}", result.parallel_tasks_count);
  let _ = writeln!(out, "Execution Time: {:.3}s", result.execution_time_seconds);

  if !result.errors.is_empty() {
    let _ = writeln!(out, "Errors: {}", result.errors.len());
    for error in result.errors.iter().take(TEXT_ERROR_LIMIT) {
      let _ = writeln!(out, "  - {error}");
    }
  }

  out.trim_end().to_string()
}

fn exit_code(outcome: PhaseOutcome) -> u8 {
  match outcome {
    PhaseOutcome::Success => 0,
    PhaseOutcome::Partial => 1,
    PhaseOutcome::Failure => 2,
  }
}

fn exit_code_for(outcome: Result<PhaseOutcome>) -> u8 {
  match outcome {
    Ok(outcome) => exit_code(outcome),
    Err(e) => {
      eprintln!("Error: {e:?}");
      ERROR_EXIT
    }
  }
}
