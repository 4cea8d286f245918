//! Detached child process launch.
//!
//! Every process generation starts the next one through the
//! [`ProcessLauncher`] capability. A launch is fire-and-forget: the parent
//! never waits for, signals or otherwise tracks the child after the spawn
//! call returned.

use crate::core::UpdateError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Description of a child process to spawn.
///
/// A spec is built fresh for every spawn and never reused. The child always
/// shares the parent's stdin, stdout and stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub executable: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

/// Capability to start a detached child process.
pub trait ProcessLauncher: Send + Sync {
    /// Start the process described by `spec` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the process could not be started.
    fn spawn_detached(&self, spec: &ProcessSpec) -> Result<(), UpdateError>;
}

impl<T: ProcessLauncher + ?Sized> ProcessLauncher for &T {
    fn spawn_detached(&self, spec: &ProcessSpec) -> Result<(), UpdateError> {
        (**self).spawn_detached(spec)
    }
}

impl<T: ProcessLauncher + ?Sized> ProcessLauncher for std::sync::Arc<T> {
    fn spawn_detached(&self, spec: &ProcessSpec) -> Result<(), UpdateError> {
        (**self).spawn_detached(spec)
    }
}

/// [`ProcessLauncher`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn spawn_detached(&self, spec: &ProcessSpec) -> Result<(), UpdateError> {
        let mut command = Command::new(&spec.executable);
        command.args(&spec.args);

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        command.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());

        debug!("Spawning {:?} with {} argument(s)", spec.executable, spec.args.len());
        let child = command
            .spawn()
            .map_err(|e| UpdateError::io("start process", &spec.executable, e))?;
        // The Child handle goes out of scope here; std neither waits for nor kills it.
        info!("Started {:?} (pid {})", spec.executable, child.id());
        Ok(())
    }
}
