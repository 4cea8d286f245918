//! Cross-platform utilities and helpers
//!
//! - [`fs`] - directory creation and executable permissions
//! - [`platform`] - user path expansion

pub mod fs;
pub mod platform;

pub use fs::{ensure_dir, ensure_parent_dir, make_executable};
pub use platform::resolve_path;
