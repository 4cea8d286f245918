//! Core types shared by every part of handover.
//!
//! At the moment this holds the error taxonomy ([`UpdateError`], [`ErrorKind`])
//! and the single-line reporting used by the binary ([`ErrorContext`],
//! [`user_friendly_error`]).

pub mod error;

pub use error::{ErrorContext, ErrorKind, UpdateError, user_friendly_error};
