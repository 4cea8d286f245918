//! handover - self-replacing executable updates
//!
//! Replaces an executable artifact with a newer version fetched from a URL,
//! without an external installer and without elevated privileges. Because a
//! running executable is locked on common platforms, the update is carried
//! out by a short chain of process generations that share nothing but the
//! filesystem and an explicit handoff message.
//!
//! # Architecture Overview
//!
//! ```text
//! original process ──spawn──▶ updater payload ──spawn──▶ updated artifact
//!   (Launcher)                 (ReplacementProtocol)      (relaunch args)
//! ```
//!
//! ## Key Features
//!
//! - **Self-contained**: the updater is a temporary copy of the running executable
//! - **Lock tolerant**: the old artifact is renamed aside with a bounded retry
//! - **Argument preserving**: restart arguments survive every process boundary byte for byte
//! - **Recoverable**: the previous version stays in a `.bak` file until rolled back
//!
//! # Core Modules
//!
//! - [`upgrade`] - handoff encoding, payload launcher, replacement protocol, staleness check
//! - [`cli`] - the `handover` command line
//! - [`config`] - global configuration (`~/.handover/config.toml`)
//! - [`core`] - error types and user-facing error rendering
//! - [`utils`] - filesystem and platform helpers
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use handover_cli::upgrade::{self, is_up_to_date_at};
//! use reqwest::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let local = upgrade::update_context()?;
//! let remote = Url::parse("https://example.com/downloads/app")?;
//!
//! if !is_up_to_date_at(&remote, &local).await? {
//!     upgrade::update(remote, &local, std::env::args_os().skip(1))?;
//!     std::process::exit(0);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
