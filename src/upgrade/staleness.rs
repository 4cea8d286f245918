//! Staleness check: does the installed artifact need an update?

use crate::core::UpdateError;
use crate::upgrade::remote::{HttpRemote, Remote};
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::path::Path;
use tracing::debug;

/// Whether the artifact at `local` is newer than the one at `url`.
///
/// A missing `local` is never up to date, and the remote is not contacted
/// in that case. Otherwise the artifact is up to date only if the remote
/// reports a modification time that is strictly earlier than the local one;
/// equal or unknown times mean an update is needed.
///
/// # Errors
///
/// Returns an error if the local metadata cannot be read or the remote
/// cannot be queried.
pub async fn is_up_to_date<R: Remote>(remote: &R, url: &Url, local: &Path) -> Result<bool, UpdateError> {
    let metadata = match tokio::fs::metadata(local).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{:?} does not exist, update needed", local);
            return Ok(false);
        }
        Err(e) => return Err(UpdateError::io("read metadata of", local, e)),
    };

    let local_modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|e| UpdateError::io("read modification time of", local, e))?;
    let remote_modified = remote.last_modified(url).await?;

    debug!("Local {:?} modified {}, remote {} modified {:?}", local, local_modified, url, remote_modified);
    Ok(is_newer(local_modified, remote_modified))
}

/// [`is_up_to_date`] against the default [`HttpRemote`].
///
/// # Errors
///
/// See [`is_up_to_date`].
pub async fn is_up_to_date_at(url: &Url, local: &Path) -> Result<bool, UpdateError> {
    is_up_to_date(&HttpRemote::new(), url, local).await
}

/// `true` iff `remote` is known and strictly earlier than `local`.
#[must_use]
pub fn is_newer(local: DateTime<Utc>, remote: Option<DateTime<Utc>>) -> bool {
    remote.is_some_and(|remote| remote < local)
}
