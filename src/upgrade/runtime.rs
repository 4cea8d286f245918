//! Runtime executable resolution.
//!
//! An artifact is either executable on its own ([`Runtime::Native`]) or run
//! by a separately installed runtime ([`Runtime::Hosted`]), e.g.
//! `<home>/bin/java -jar app.jar`. [`Runtime::launch_spec`] turns an
//! artifact path and a list of extra arguments into the [`ProcessSpec`]
//! used for both the updater generation and the relaunch.

use crate::core::UpdateError;
use crate::upgrade::process::ProcessSpec;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How an artifact is started.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Runtime {
    /// The artifact is an executable and is started directly.
    #[default]
    Native,
    /// The artifact is handed to a runtime installation.
    Hosted(HostedRuntime),
}

/// A runtime installation that executes artifacts on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedRuntime {
    /// Installation root of the runtime.
    pub home: PathBuf,
    /// Console entry point, relative to `home` (e.g. `bin/java`).
    pub executable: PathBuf,
    /// File name of a windowed entry point living next to `executable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowed_executable: Option<String>,
    /// Fixed arguments placed before the artifact path (e.g. `-jar`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub launch_args: Vec<String>,
}

impl HostedRuntime {
    /// A Java installation rooted at `home`.
    pub fn java(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            executable: PathBuf::from("bin").join("java"),
            windowed_executable: Some("javaw.exe".to_string()),
            launch_args: vec!["-jar".to_string()],
        }
    }

    /// Resolve the entry point for the current process.
    ///
    /// Without an interactive console the windowed variant is preferred if
    /// it exists on disk.
    #[must_use]
    pub fn resolve_executable(&self) -> PathBuf {
        self.resolve_for_console(console_attached())
    }

    /// Resolve the entry point given whether a console is attached.
    #[must_use]
    pub fn resolve_for_console(&self, console_attached: bool) -> PathBuf {
        let console = self.home.join(&self.executable);

        if !console_attached && let Some(windowed) = &self.windowed_executable {
            let candidate = console.with_file_name(windowed);
            if candidate.exists() {
                debug!("No console attached, using windowed runtime {:?}", candidate);
                return candidate;
            }
        }

        console
    }
}

impl Runtime {
    /// The executable that has to be spawned to run `artifact`.
    #[must_use]
    pub fn executable_for(&self, artifact: &Path) -> PathBuf {
        let executable = match self {
            Self::Native => artifact.to_path_buf(),
            Self::Hosted(hosted) => hosted.resolve_executable(),
        };
        std::path::absolute(&executable).unwrap_or(executable)
    }

    /// Build the process spec starting `artifact` with `extra_args` appended after
    /// the runtime's fixed launch arguments.
    pub fn launch_spec<I, S>(&self, artifact: &Path, extra_args: I) -> ProcessSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let spec = ProcessSpec::new(self.executable_for(artifact));
        let spec = match self {
            Self::Native => spec,
            Self::Hosted(hosted) => spec.args(hosted.launch_args.iter().map(OsString::from)).arg(artifact),
        };
        spec.args(extra_args)
    }
}

/// Whether an interactive console is attached to this process.
#[must_use]
pub fn console_attached() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Path of the artifact the current process is running from.
///
/// # Errors
///
/// Returns [`UpdateError::Io`] if the platform cannot report the path of the
/// running executable.
pub fn update_context() -> Result<PathBuf, UpdateError> {
    std::env::current_exe()
        .map_err(|e| UpdateError::io("locate running executable", Path::new("<current exe>"), e))
}
