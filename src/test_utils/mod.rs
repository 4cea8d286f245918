//! Test utilities for handover
//!
//! Test doubles for the capabilities the replacement protocol is generic
//! over, plus one-time logging setup for tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use handover_cli::test_utils::{FakeRemote, RecordingLauncher};
//! use handover_cli::upgrade::{ReplacementProtocol, UpdateRequest};
//!
//! # async fn example(request: UpdateRequest) -> Result<(), handover_cli::core::UpdateError> {
//! let launcher = RecordingLauncher::new();
//! ReplacementProtocol::new(FakeRemote::new(b"v2".to_vec()))
//!     .with_launcher(&launcher)
//!     .run(&request)
//!     .await?;
//! assert_eq!(launcher.spawned().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod doubles;

pub use doubles::{FakeRemote, LockedRenamer, MemoryStream, RecordingLauncher};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=handover_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
