//! The replacement protocol run by the updater process.
//!
//! ```text
//! Start -> EvictExisting -> Fetch -> Installed -> Relaunch -> Done
//! ```
//!
//! `EvictExisting` is skipped when the destination does not exist, so a run
//! that failed during `Fetch` can simply be repeated. Nothing is rolled back
//! automatically: after a failure the previous version stays in its backup
//! file until an operator restores it.

use crate::core::UpdateError;
use crate::upgrade::backup::{BackupManager, Eviction, EvictionPolicy, FsRenamer, Renamer};
use crate::upgrade::handoff::UpdateRequest;
use crate::upgrade::process::{ProcessLauncher, ProcessSpec, SystemLauncher};
use crate::upgrade::remote::{Remote, RemoteStream};
use crate::upgrade::runtime::Runtime;
use crate::utils::fs::{ensure_parent_dir, make_executable};
use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    EvictExisting,
    Fetch,
    Installed,
    Relaunch,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::EvictExisting => "evict-existing",
            Self::Fetch => "fetch",
            Self::Installed => "installed",
            Self::Relaunch => "relaunch",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolReport {
    /// `None` when there was nothing to evict.
    pub eviction: Option<Eviction>,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    /// The relaunch that was spawned.
    pub relaunch: ProcessSpec,
}

/// Replaces an artifact with a remote version and relaunches it.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::upgrade::{HttpRemote, ReplacementProtocol, UpdateRequest};
///
/// # async fn example(request: UpdateRequest) -> Result<(), handover_cli::core::UpdateError> {
/// let report = ReplacementProtocol::new(HttpRemote::new()).run(&request).await?;
/// println!("installed {} bytes", report.bytes_written);
/// # Ok(())
/// # }
/// ```
pub struct ReplacementProtocol<R, L = SystemLauncher, N = FsRenamer> {
    remote: R,
    launcher: L,
    renamer: N,
    policy: EvictionPolicy,
    runtime: Runtime,
}

impl<R: Remote> ReplacementProtocol<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            launcher: SystemLauncher,
            renamer: FsRenamer,
            policy: EvictionPolicy::default(),
            runtime: Runtime::Native,
        }
    }
}

impl<R: Remote, L: ProcessLauncher, N: Renamer> ReplacementProtocol<R, L, N> {
    /// Spawn the relaunch through `launcher`.
    pub fn with_launcher<L2: ProcessLauncher>(self, launcher: L2) -> ReplacementProtocol<R, L2, N> {
        ReplacementProtocol {
            remote: self.remote,
            launcher,
            renamer: self.renamer,
            policy: self.policy,
            runtime: self.runtime,
        }
    }

    /// Evict the destination through `renamer`.
    pub fn with_renamer<N2: Renamer>(self, renamer: N2) -> ReplacementProtocol<R, L, N2> {
        ReplacementProtocol {
            remote: self.remote,
            launcher: self.launcher,
            renamer,
            policy: self.policy,
            runtime: self.runtime,
        }
    }

    #[must_use]
    pub const fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runtime used to start the installed artifact.
    #[must_use]
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Run the protocol to completion.
    ///
    /// # Errors
    ///
    /// Any failing step aborts the run; see [`run_until`](Self::run_until).
    pub async fn run(&self, request: &UpdateRequest) -> Result<ProtocolReport, UpdateError> {
        self.run_until(request, std::future::pending()).await
    }

    /// Run the protocol, abandoning the eviction wait once `interrupt`
    /// completes.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Io`] if eviction exhausts its attempts, the
    ///   destination cannot be written or the relaunch cannot be spawned
    /// - [`UpdateError::Fetch`] or [`UpdateError::UnsupportedScheme`] if the
    ///   remote cannot be read
    /// - [`UpdateError::InterruptedWait`] if `interrupt` fired during eviction
    pub async fn run_until<F>(&self, request: &UpdateRequest, interrupt: F) -> Result<ProtocolReport, UpdateError>
    where
        F: Future<Output = ()>,
    {
        let local = request.local();
        enter(Phase::Start, local);

        let eviction = if local.exists() {
            enter(Phase::EvictExisting, local);
            let manager = BackupManager::with_renamer(local.to_path_buf(), &self.renamer).policy(self.policy);
            Some(manager.evict_until(interrupt).await?)
        } else {
            debug!("{:?} does not exist, nothing to evict", local);
            None
        };

        enter(Phase::Fetch, local);
        let bytes_written = self.fetch(request).await?;

        enter(Phase::Installed, local);
        if self.runtime == Runtime::Native {
            make_executable(local)?;
        }

        enter(Phase::Relaunch, local);
        let relaunch = self.relaunch_spec(request);
        self.launcher.spawn_detached(&relaunch)?;

        enter(Phase::Done, local);
        Ok(ProtocolReport {
            eviction,
            bytes_written,
            relaunch,
        })
    }

    /// The spec used to start the installed artifact.
    pub fn relaunch_spec(&self, request: &UpdateRequest) -> ProcessSpec {
        let local = request.local();
        let spec = self.runtime.launch_spec(local, request.restart_args().iter().cloned());
        match local.parent() {
            Some(parent) => spec.working_dir(parent),
            None => spec,
        }
    }

    /// Stream the remote into a staging file beside `local` and move it into
    /// place once the stream is complete. On failure the staging file is
    /// removed and `local` is left untouched.
    async fn fetch(&self, request: &UpdateRequest) -> Result<u64, UpdateError> {
        let local = request.local();
        ensure_parent_dir(local)?;
        let parent = local.parent().unwrap_or_else(|| Path::new("."));

        let mut stream = self.remote.open(request.remote()).await?;
        let staging = tempfile::Builder::new()
            .prefix(&staging_prefix(local))
            .tempfile_in(parent)
            .map_err(|e| UpdateError::io("create staging file in", parent, e))?;
        let staging_path = staging.path().to_path_buf();

        let handle = staging.as_file().try_clone().map_err(|e| UpdateError::io("open", &staging_path, e))?;
        let mut file = tokio::fs::File::from_std(handle);

        let mut written = 0u64;
        while let Some(chunk) = stream.next_chunk().await? {
            file.write_all(&chunk).await.map_err(|e| UpdateError::io("write", &staging_path, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| UpdateError::io("write", &staging_path, e))?;
        file.sync_all().await.map_err(|e| UpdateError::io("sync", &staging_path, e))?;
        drop(file);

        staging.persist(local).map_err(|e| UpdateError::io("move download to", local, e.error))?;

        info!("Fetched {} bytes from {} into {:?}", written, request.remote(), local);
        Ok(written)
    }
}

/// Hidden name prefix for the staging file of `local`, e.g. `.app.jar.`.
fn staging_prefix(local: &Path) -> OsString {
    let mut prefix = OsString::from(".");
    if let Some(name) = local.file_name() {
        prefix.push(name);
        prefix.push(".");
    }
    prefix
}

fn enter(phase: Phase, local: &Path) {
    debug!(%phase, "Replacement of {:?}", local);
}
