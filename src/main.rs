//! Karaoke Minder - a karaoke library manager.
//!
//! Resolves artist, title, song ID and duration for karaoke files (CDG+MP3
//! zips, bare CDGs, videos) from their file names or embedded tags, and
//! keeps the results in a SQLite library alongside regular singers.

pub mod archive;
pub mod cdg;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod karaoke;
pub mod library;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod rotation;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
pub mod update;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("karaoke_minder=info".parse()?))
        .init();

    let config = config::load();
    cli::run_command(&args, &config)
}
