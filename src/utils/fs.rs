//! File system helpers used by the update protocol.

use crate::core::UpdateError;
use std::path::Path;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or if creation fails.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> Result<(), handover_cli::core::UpdateError> {
/// ensure_dir(Path::new("/opt/app/lib"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<(), UpdateError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| UpdateError::io("create directory", path, e))?;
    } else if !path.is_dir() {
        return Err(UpdateError::io(
            "create directory",
            path,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        ));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
///
/// A path without a parent is accepted as is.
pub fn ensure_parent_dir(path: &Path) -> Result<(), UpdateError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Mark `path` as executable for everyone (`0o755`).
///
/// A no-op on platforms without Unix permission bits.
pub fn make_executable(path: &Path) -> Result<(), UpdateError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| UpdateError::io("set permissions on", path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
