//! Payload builder and first updater generation.
//!
//! The running artifact cannot replace itself while it is locked, so the
//! [`Launcher`] copies the updater logic (by default the running executable)
//! into a temporary payload and starts that copy with the `apply` entry
//! point and the handoff message. The caller is expected to exit right
//! after [`Launcher::launch`] returns so the payload can evict it.

use crate::constants::{APPLY_SUBCOMMAND, CONFIG_FLAG, DEFAULT_PAYLOAD_PREFIX, DESCRIPTOR_EXTENSION};
use crate::core::UpdateError;
use crate::upgrade::config::UpgradeConfig;
use crate::upgrade::handoff::UpdateRequest;
use crate::upgrade::process::{ProcessLauncher, ProcessSpec, SystemLauncher};
use crate::upgrade::runtime::{Runtime, update_context};
use crate::utils::fs::make_executable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Diagnostic sidecar written next to the payload.
///
/// Only meant for humans inspecting leftover payloads in the temp
/// directory; the protocol never reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadDescriptor {
    pub remote: String,
    pub local_name: String,
    pub created_at: DateTime<Utc>,
}

/// What [`Launcher::launch`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    /// The temporary payload executable.
    pub payload: PathBuf,
    /// Its diagnostic sidecar.
    pub descriptor: PathBuf,
    /// The updater process that was spawned.
    pub spec: ProcessSpec,
}

/// Builds the temporary payload and spawns the updater process.
///
/// # Examples
///
/// ```rust,no_run
/// use handover_cli::upgrade::{Launcher, UpdateRequest};
/// use reqwest::Url;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let request = UpdateRequest::new(
///     Url::parse("https://example.com/app-2.0")?,
///     "/opt/app/app",
///     ["--resume"],
/// )?;
/// Launcher::new().prefix("myapp-updater").launch(&request)?;
/// std::process::exit(0);
/// # }
/// ```
pub struct Launcher<L = SystemLauncher> {
    prefix: String,
    payload_source: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    launcher: L,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PAYLOAD_PREFIX.to_string(),
            payload_source: None,
            temp_dir: None,
            config_path: None,
            launcher: SystemLauncher,
        }
    }

    /// A launcher using the payload prefix resolved from `config`.
    pub fn from_config(config: &UpgradeConfig) -> Self {
        Self::new().prefix(config.payload_prefix())
    }
}

impl<L: ProcessLauncher> Launcher<L> {
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use `path` as payload instead of the running executable.
    #[must_use]
    pub fn payload_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_source = Some(path.into());
        self
    }

    /// Create the payload in `dir` instead of the system temp directory.
    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Hand `path` to the updater process as its global configuration file.
    ///
    /// Without it the updater resolves its configuration the usual way
    /// (environment, then the default location).
    #[must_use]
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_launcher<L2: ProcessLauncher>(self, launcher: L2) -> Launcher<L2> {
        Launcher {
            prefix: self.prefix,
            payload_source: self.payload_source,
            temp_dir: self.temp_dir,
            config_path: self.config_path,
            launcher,
        }
    }

    /// Build the payload and start the updater process for `request`.
    ///
    /// Returns as soon as the process was spawned; it is never awaited.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the payload cannot be created or the
    /// updater cannot be spawned. The calling process is left untouched.
    pub fn launch(&self, request: &UpdateRequest) -> Result<LaunchReport, UpdateError> {
        let source = match &self.payload_source {
            Some(path) => path.clone(),
            None => update_context()?,
        };

        let mut updater_args: Vec<OsString> = Vec::new();
        if let Some(config) = &self.config_path {
            let config =
                std::path::absolute(config).map_err(|e| UpdateError::io("resolve config path", config, e))?;
            updater_args.push(CONFIG_FLAG.into());
            updater_args.push(config.into_os_string());
        }
        updater_args.push(APPLY_SUBCOMMAND.into());
        updater_args.extend(request.encode());

        let payload = self.build_payload(&source)?;
        let descriptor = write_descriptor(&payload, request)?;

        let spec = Runtime::Native.launch_spec(&payload, updater_args);
        self.launcher.spawn_detached(&spec)?;

        info!("Handed update of {:?} over to {:?}", request.local(), payload);
        Ok(LaunchReport {
            payload,
            descriptor,
            spec,
        })
    }

    fn build_payload(&self, source: &Path) -> Result<PathBuf, UpdateError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix).suffix(std::env::consts::EXE_SUFFIX);

        let temp_location = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let mut temp = builder
            .tempfile_in(&temp_location)
            .map_err(|e| UpdateError::io("create payload in", &temp_location, e))?;
        let temp_path = temp.path().to_path_buf();

        let mut input =
            std::fs::File::open(source).map_err(|e| UpdateError::io("open payload source", source, e))?;
        let copied = std::io::copy(&mut input, temp.as_file_mut())
            .map_err(|e| UpdateError::io("copy payload to", &temp_path, e))?;
        temp.as_file().sync_all().map_err(|e| UpdateError::io("sync payload", &temp_path, e))?;

        let (file, payload) = temp.keep().map_err(|e| UpdateError::io("keep payload", &temp_path, e.error))?;
        // Close the handle before spawning; Linux refuses to exec a file open for writing.
        drop(file);
        make_executable(&payload)?;

        debug!("Built payload {:?} ({} bytes) from {:?}", payload, copied, source);
        Ok(payload)
    }
}

/// Convenience entry point: hand `local` over to an updater that installs
/// `remote` and relaunches with `restart_args`.
///
/// Uses the running executable as payload and the prefix from the
/// environment or the default. The caller must exit promptly afterwards.
///
/// # Errors
///
/// See [`Launcher::launch`].
pub fn update<I, S>(remote: reqwest::Url, local: impl AsRef<Path>, restart_args: I) -> Result<LaunchReport, UpdateError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let request = UpdateRequest::new(remote, local, restart_args)?;
    Launcher::from_config(&UpgradeConfig::default()).launch(&request)
}

fn descriptor_path(payload: &Path) -> PathBuf {
    let mut name = payload.as_os_str().to_owned();
    name.push(".");
    name.push(DESCRIPTOR_EXTENSION);
    PathBuf::from(name)
}

fn write_descriptor(payload: &Path, request: &UpdateRequest) -> Result<PathBuf, UpdateError> {
    let descriptor = PayloadDescriptor {
        remote: request.remote().to_string(),
        local_name: request
            .local()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        created_at: Utc::now(),
    };

    let path = descriptor_path(payload);
    let json = serde_json::to_vec_pretty(&descriptor)
        .map_err(|e| UpdateError::io("serialize descriptor", &path, std::io::Error::other(e)))?;
    std::fs::write(&path, json).map_err(|e| UpdateError::io("write descriptor", &path, e))?;
    Ok(path)
}
