use crate::constants::{BACKUP_EXTENSION, EVICTION_MAX_ATTEMPTS, EVICTION_RETRY_DELAY};
use crate::core::UpdateError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, warn};

/// Derive the backup location for an installed artifact.
///
/// The final extension segment is replaced with `.bak`; a file without an
/// extension gets `.bak` appended. An artifact that already ends in `.bak`
/// gets a second `.bak` so the backup never collides with the artifact.
///
/// # Examples
///
/// ```rust
/// use handover_cli::upgrade::backup::backup_path_for;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(backup_path_for(Path::new("/opt/app/app.jar")), PathBuf::from("/opt/app/app.bak"));
/// assert_eq!(backup_path_for(Path::new("/opt/app/app")), PathBuf::from("/opt/app/app.bak"));
/// assert_eq!(backup_path_for(Path::new("/opt/app/app.tar.gz")), PathBuf::from("/opt/app/app.tar.bak"));
/// ```
#[must_use]
pub fn backup_path_for(artifact: &Path) -> PathBuf {
    if artifact.extension().is_some_and(|ext| ext == BACKUP_EXTENSION) {
        let mut name = artifact.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".");
        name.push(BACKUP_EXTENSION);
        artifact.with_file_name(name)
    } else {
        artifact.with_extension(BACKUP_EXTENSION)
    }
}

/// Capability to atomically rename a file, replacing the target.
///
/// Exists so tests can simulate an artifact that is still locked by the
/// previous process generation.
pub trait Renamer: Send + Sync {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;
}

/// [`Renamer`] backed by [`std::fs::rename`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRenamer;

impl Renamer for FsRenamer {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }
}

impl<T: Renamer + ?Sized> Renamer for &T {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        (**self).rename(from, to)
    }
}

impl<T: Renamer + ?Sized> Renamer for Arc<T> {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        (**self).rename(from, to)
    }
}

/// Attempt budget and spacing for the eviction rename.
///
/// The delay is slept on the tokio clock, so tests can run the loop on a
/// paused clock without waiting in real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Total number of rename attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between two attempts.
    pub delay: Duration,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: EVICTION_MAX_ATTEMPTS,
            delay: EVICTION_RETRY_DELAY,
        }
    }
}

impl EvictionPolicy {
    /// Delays slept between consecutive attempts.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + use<> {
        FixedInterval::new(self.delay).take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Result of a successful eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    /// Where the former artifact now lives.
    pub backup: PathBuf,
    /// Number of rename attempts it took.
    pub attempts: u32,
}

/// Moves an installed artifact out of the way and back.
///
/// The artifact is renamed to its [`backup_path_for`] location. The backup
/// is never removed by this type; after a failed update it is the only copy
/// of the previous version and [`restore`](Self::restore) is the operator's
/// way back.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::upgrade::backup::BackupManager;
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), handover_cli::core::UpdateError> {
/// let manager = BackupManager::new(PathBuf::from("/opt/app/app.jar"));
///
/// let eviction = manager.evict().await?;
/// println!("previous version kept at {}", eviction.backup.display());
/// # Ok(())
/// # }
/// ```
pub struct BackupManager<R = FsRenamer> {
    original_path: PathBuf,
    backup_path: PathBuf,
    renamer: R,
    policy: EvictionPolicy,
}

impl BackupManager<FsRenamer> {
    /// Create a manager for `artifact` using the real filesystem.
    pub fn new(artifact: PathBuf) -> Self {
        Self::with_renamer(artifact, FsRenamer)
    }
}

impl<R: Renamer> BackupManager<R> {
    /// Create a manager for `artifact` that renames through `renamer`.
    pub fn with_renamer(artifact: PathBuf, renamer: R) -> Self {
        let backup_path = backup_path_for(&artifact);
        Self {
            original_path: artifact,
            backup_path,
            renamer,
            policy: EvictionPolicy::default(),
        }
    }

    #[must_use]
    pub const fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rename the artifact to its backup path, retrying while it is locked.
    ///
    /// # Errors
    ///
    /// Returns the last rename error as [`UpdateError::Io`] once the attempt
    /// budget is exhausted.
    pub async fn evict(&self) -> Result<Eviction, UpdateError> {
        self.evict_until(std::future::pending()).await
    }

    /// Like [`evict`](Self::evict), but gives up as soon as `interrupt`
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InterruptedWait`] if `interrupt` resolves
    /// before the rename succeeded or the budget ran out.
    pub async fn evict_until<F>(&self, interrupt: F) -> Result<Eviction, UpdateError>
    where
        F: Future<Output = ()>,
    {
        debug!("Evicting {:?} to {:?}", self.original_path, self.backup_path);
        let attempts =
            self.rename_with_retry(&self.original_path, &self.backup_path, "evict", interrupt).await?;

        info!("Moved previous version to {:?}", self.backup_path);
        Ok(Eviction {
            backup: self.backup_path.clone(),
            attempts,
        })
    }

    /// Move the backup back over the artifact.
    ///
    /// # Errors
    ///
    /// Fails with [`UpdateError::Io`] if there is no backup or it cannot be
    /// renamed within the attempt budget.
    pub async fn restore(&self) -> Result<(), UpdateError> {
        if !self.backup_exists() {
            return Err(UpdateError::io(
                "restore backup",
                &self.backup_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no backup found"),
            ));
        }

        warn!("Restoring {:?} from {:?}", self.original_path, self.backup_path);
        self.rename_with_retry(
            &self.backup_path,
            &self.original_path,
            "restore",
            std::future::pending(),
        )
        .await?;

        info!("Successfully restored from backup");
        Ok(())
    }

    async fn rename_with_retry<F>(
        &self,
        from: &Path,
        to: &Path,
        operation: &str,
        interrupt: F,
    ) -> Result<u32, UpdateError>
    where
        F: Future<Output = ()>,
    {
        let attempts = AtomicU32::new(0);
        let max_attempts = self.policy.max_attempts.max(1);

        let retry = Retry::spawn(self.policy.schedule(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let result = self.renamer.rename(from, to);
            if let Err(e) = &result {
                warn!("{} attempt {}/{} for {:?} failed: {}", operation, attempt, max_attempts, from, e);
            }
            std::future::ready(result)
        });

        tokio::select! {
            biased;
            result = retry => {
                result.map_err(|e| UpdateError::io(operation, from, e))?;
                Ok(attempts.load(Ordering::SeqCst))
            }
            () = interrupt => Err(UpdateError::InterruptedWait {
                path: from.display().to_string(),
                attempts: attempts.load(Ordering::SeqCst),
            }),
        }
    }

    pub fn backup_exists(&self) -> bool {
        self.backup_path.exists()
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn original_path(&self) -> &Path {
        &self.original_path
    }
}
