//! Error handling for handover
//!
//! The update protocol runs across several process generations and none of
//! them can ask the user anything, so errors are deliberately simple:
//! every failure is one of three kinds and is reported as a single line on
//! the error stream before the process exits with status `1`.
//!
//! # Error Categories
//!
//! - **Malformed input**: [`UpdateError::MalformedInput`] - the handoff
//!   message is missing a required flag or carries an unusable value
//! - **I/O failure**: [`UpdateError::Io`], [`UpdateError::Fetch`],
//!   [`UpdateError::UnsupportedScheme`] - temp files, payload copy,
//!   directory creation, renames, downloads and spawns
//! - **Interrupted wait**: [`UpdateError::InterruptedWait`] - the eviction
//!   retry loop was interrupted before it could finish
//!
//! Use [`user_friendly_error`] to turn any `anyhow::Error` into the
//! one-line report printed by the binary.
//!
//! # Examples
//!
//! ```rust,no_run
//! use handover_cli::core::{ErrorKind, UpdateError, user_friendly_error};
//!
//! let error = UpdateError::MalformedInput {
//!     reason: "missing --remote".to_string(),
//! };
//! assert_eq!(error.kind(), ErrorKind::MalformedInput);
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // error: Malformed handoff message: missing --remote
//! ```

use colored::Colorize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Coarse classification of an [`UpdateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required handoff flags missing or invocation malformed. Never retried.
    MalformedInput,
    /// Any filesystem, network or process failure.
    IoFailure,
    /// The eviction retry loop was interrupted.
    InterruptedWait,
}

/// Errors produced by the update protocol.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The handoff message could not be decoded.
    #[error("Malformed handoff message: {reason}")]
    MalformedInput {
        /// What was wrong with the token list
        reason: String,
    },

    /// A local filesystem or process operation failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        /// The operation that failed (e.g. "rename", "create directory")
        operation: String,
        /// The path the operation was applied to
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading the remote location failed.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// The remote location
        url: String,
        /// Transport-level reason
        reason: String,
    },

    /// The remote location uses a scheme no remote source understands.
    #[error("Unsupported remote location: {url}")]
    UnsupportedScheme {
        /// The remote location
        url: String,
    },

    /// The eviction retry loop was interrupted while waiting.
    #[error("Eviction of {path} interrupted after {attempts} attempt(s)")]
    InterruptedWait {
        /// The artifact that was being evicted
        path: String,
        /// How many rename attempts were made before the interrupt
        attempts: u32,
    },
}

impl UpdateError {
    /// Build an [`UpdateError::Io`] for `operation` on `path`.
    pub fn io(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.display().to_string(),
            source,
        }
    }

    /// Build an [`UpdateError::MalformedInput`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    /// The coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput {
                ..
            } => ErrorKind::MalformedInput,
            Self::InterruptedWait {
                ..
            } => ErrorKind::InterruptedWait,
            Self::Io {
                ..
            }
            | Self::Fetch {
                ..
            }
            | Self::UnsupportedScheme {
                ..
            } => ErrorKind::IoFailure,
        }
    }
}

/// A single-line, user-facing rendering of an error.
///
/// The full error chain is flattened into one line so that every process
/// generation reports failures the same way, whether it is attached to a
/// terminal or not.
#[derive(Debug)]
pub struct ErrorContext {
    /// Flattened error message including causes
    pub message: String,
    /// Classification when the root error is an [`UpdateError`]
    pub kind: Option<ErrorKind>,
}

impl ErrorContext {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
        }
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Print the error to stderr.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into the single-line report shown to the user.
///
/// Causes are appended with `": "` unless the parent message already ends
/// with the cause text (which is the case for `#[error("...: {source}")]`
/// variants).
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let kind = error.chain().find_map(|e| e.downcast_ref::<UpdateError>()).map(UpdateError::kind);

    let mut message = String::new();
    for cause in error.chain() {
        let text = cause.to_string().replace('\n', " ");
        if message.is_empty() {
            message = text;
        } else if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
    }

    let ctx = ErrorContext::new(message);
    match kind {
        Some(kind) => ctx.with_kind(kind),
        None => ctx,
    }
}
