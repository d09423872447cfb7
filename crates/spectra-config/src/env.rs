//! Environment variable handling.

use std::str::FromStr;

use tracing::warn;

/// Environment variable names.
pub mod vars {
  /// Phase deadline in seconds (float).
  pub const TIMEOUT: &str = "SPEC_ACCELERATOR_TIMEOUT";
  pub const MAX_RETRIES: &str = "SPEC_ACCELERATOR_MAX_RETRIES";
  pub const MAX_CONCURRENT: &str = "SPEC_ACCELERATOR_MAX_CONCURRENT";
  /// Enables fallback iff the value is `true`, case-insensitive.
  pub const FALLBACK: &str = "SPEC_ACCELERATOR_FALLBACK";
}

/// Look up a variable, treating empty values as unset.
pub(crate) fn lookup_non_empty<L>(lookup: &L, var: &str) -> Option<String>
where
  L: Fn(&str) -> Option<String>,
{
  lookup(var).filter(|v| !v.trim().is_empty())
}

/// Parse a variable. Unparseable values are logged and treated as unset.
pub(crate) fn parse_var<T, L>(lookup: &L, var: &str) -> Option<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
  L: Fn(&str) -> Option<String>,
{
  let raw = lookup_non_empty(lookup, var)?;
  match raw.trim().parse::<T>() {
    Ok(value) => Some(value),
    Err(e) => {
      warn!(var, value = %raw, error = %e, "ignoring invalid environment override");
      None
    }
  }
}

/// Parse a boolean flag: `true` in any case is true, anything else false.
pub(crate) fn parse_flag<L>(lookup: &L, var: &str) -> Option<bool>
where
  L: Fn(&str) -> Option<String>,
{
  lookup_non_empty(lookup, var).map(|v| v.trim().eq_ignore_ascii_case("true"))
}
