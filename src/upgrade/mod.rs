//! Self-replacement across process generations.
//!
//! A running artifact cannot overwrite itself on every platform, so an
//! update is carried out by a chain of processes that only share the
//! filesystem and one explicit handoff message.
//!
//! # Architecture Overview
//!
//! - **[`handoff`]**: encodes an [`UpdateRequest`] into a process argument list and back
//! - **[`launcher`]**: copies the updater logic into a temporary payload and spawns it
//! - **[`protocol`]**: the state machine run by the updater (evict, fetch, install, relaunch)
//! - **[`backup`]**: backup naming, the bounded eviction retry and manual restore
//! - **[`remote`]**: fetch-by-URL for `http(s)://` and `file://`
//! - **[`staleness`]**: decides whether an update is needed at all
//! - **[`runtime`]**: which executable starts an artifact, native or hosted
//! - **[`process`]**: detached child process launch
//! - **[`config`]**: the `[upgrade]` configuration table
//!
//! ## Process Generations
//!
//! ```text
//! 1. Original process (generation 0)
//!    ├── Copy own executable to <temp>/<prefix>XXXX<exe suffix>
//!    ├── Spawn: <payload> apply --remote URL --local PATH [--args ...]
//!    └── Exit
//!
//! 2. Updater process (generation 1)
//!    ├── Rename PATH to its .bak sibling, retrying while still locked
//!    ├── Stream URL into PATH
//!    ├── Mark PATH executable (native runtime, Unix)
//!    ├── Spawn the updated artifact with the restart arguments
//!    └── Exit 0
//!
//! 3. Relaunched artifact (generation 2)
//! ```
//!
//! The backup is never removed automatically. When an update fails after
//! eviction, `handover rollback` moves it back.
//!
//! # Examples
//!
//! ```rust,no_run
//! use handover_cli::upgrade;
//! use reqwest::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let local = upgrade::update_context()?;
//! let remote = Url::parse("https://example.com/downloads/app")?;
//!
//! upgrade::update(remote, &local, std::env::args_os().skip(1))?;
//! std::process::exit(0);
//! # }
//! ```

pub mod backup;
pub mod config;
pub mod handoff;
pub mod launcher;
pub mod process;
pub mod protocol;
pub mod remote;
pub mod runtime;
pub mod staleness;

pub use backup::{BackupManager, EvictionPolicy, backup_path_for};
pub use config::UpgradeConfig;
pub use handoff::UpdateRequest;
pub use launcher::{LaunchReport, Launcher, update};
pub use process::{ProcessLauncher, ProcessSpec, SystemLauncher};
pub use protocol::{Phase, ProtocolReport, ReplacementProtocol};
pub use remote::{HttpRemote, Remote};
pub use runtime::{HostedRuntime, Runtime, update_context};
pub use staleness::{is_up_to_date, is_up_to_date_at};
