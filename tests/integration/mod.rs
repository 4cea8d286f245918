//! Integration test suite for handover
//!
//! End-to-end tests that drive the `handover` binary and the public library
//! API against real files, child processes and a local HTTP server.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **apply**: the updater process (evict, fetch, install, relaunch)
//! - **check**: staleness reporting
//! - **cli_errors**: exit codes and single-line error reports
//! - **http_remote**: fetching over HTTP from a local server
//! - **rollback**: manual recovery from the backup
//! - **update**: the full chain from `update` through the payload to the relaunch

mod common;

mod apply;
mod check;
mod cli_errors;
mod http_remote;
mod rollback;
mod update;
