//! Platform-specific helpers.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expand `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Fails if a referenced environment variable is not set or the home
/// directory cannot be determined.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let path = resolve_path("~/bin/app")?;
/// assert!(path.is_absolute());
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("Invalid path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
