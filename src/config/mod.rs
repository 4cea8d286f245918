//! Configuration for handover.
//!
//! There is a single user-wide TOML file, see [`GlobalConfig`]. Per-update
//! state is never configured here; it travels in the handoff message.

pub mod global;

pub use global::GlobalConfig;
