//! Command-line interface for karaoke-minder.
//!
//! Commands cover library scanning, source directory and naming pattern
//! setup, regular singers, and the update check.

mod commands;

pub use commands::{Cli, run_command};
