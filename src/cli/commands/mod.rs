//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `library`: scanning, listing and inspecting karaoke files
//! - `sources`: source directories and custom naming patterns
//! - `regulars`: regular singers and rotation previews
//! - `updates`: new-version check

mod library;
mod regulars;
mod sources;
mod updates;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;
use crate::naming::NamingPattern;
use crate::rotation::AddPosition;

pub use library::{cmd_inspect, cmd_list, cmd_scan};
pub use regulars::{
    cmd_regulars_add, cmd_regulars_add_song, cmd_regulars_list, cmd_regulars_load,
    cmd_regulars_remove, cmd_regulars_rename,
};
pub use sources::{cmd_pattern_add, cmd_pattern_list, cmd_source_add, cmd_source_list};
pub use updates::cmd_check_updates;

/// Karaoke Minder CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true, env = "KARAOKE_MINDER_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a registered source directory into the library
    Scan {
        /// Source directory (must be added with `source add` first)
        path: PathBuf,
    },
    /// List songs in the library
    List {
        /// Only songs whose artist, title or song ID contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a single file and print its fields
    Inspect {
        /// Karaoke file (.zip, .cdg, or a video)
        file: PathBuf,
        /// Naming pattern (default: the source directory's, else the configured default)
        #[arg(short, long, value_enum)]
        pattern: Option<NamingPattern>,
        /// Source directory the file belongs to (default: its parent)
        #[arg(short, long)]
        source: Option<PathBuf>,
    },
    /// Manage source directories
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Manage custom naming patterns
    Pattern {
        #[command(subcommand)]
        action: PatternAction,
    },
    /// Manage regular singers
    Regulars {
        #[command(subcommand)]
        action: RegularsAction,
    },
    /// Check for a newer release
    CheckUpdates,
    /// Show or initialize the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum SourceAction {
    /// Register a directory, or change its naming pattern
    Add {
        path: PathBuf,
        /// Naming pattern (default from config)
        #[arg(short, long, value_enum)]
        pattern: Option<NamingPattern>,
        /// Custom pattern ID, for `--pattern custom`
        #[arg(long)]
        custom_id: Option<i64>,
    },
    /// List registered directories
    List,
}

#[derive(Subcommand)]
pub enum PatternAction {
    /// Store a custom pattern. Leave a regex empty to skip that field.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        artist_regex: String,
        #[arg(long, default_value_t = 1)]
        artist_group: i64,
        #[arg(long, default_value = "")]
        title_regex: String,
        #[arg(long, default_value_t = 1)]
        title_group: i64,
        #[arg(long, default_value = "")]
        song_id_regex: String,
        #[arg(long, default_value_t = 1)]
        song_id_group: i64,
    },
    /// List stored custom patterns
    List,
}

#[derive(Subcommand)]
pub enum RegularsAction {
    /// List regular singers and their saved songs
    List,
    /// Create a regular singer
    Add { name: String },
    /// Rename a regular singer
    Rename { name: String, new_name: String },
    /// Delete a regular singer and their saved songs
    Remove { name: String },
    /// Save a library song to a regular singer's list
    AddSong {
        name: String,
        /// Library song ID (see `list --json`)
        song: i64,
        /// Key change in semitones
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        key_change: i64,
    },
    /// Load regular singers into a rotation and print the result
    Load {
        /// Names in the order they are added
        #[arg(required = true)]
        names: Vec<String>,
        #[arg(short, long, value_enum, default_value_t)]
        position: AddPosition,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the current configuration to the config file
    Init,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let db_path = cli.db.clone().or_else(|| config.library.database.clone());
    let db_path = db_path.as_deref();

    match &cli.command {
        Commands::Scan { path } => cmd_scan(&rt, db_path, path),
        Commands::List { search, json } => cmd_list(&rt, db_path, search.as_deref(), *json),
        Commands::Inspect {
            file,
            pattern,
            source,
        } => cmd_inspect(&rt, db_path, config, file, *pattern, source.as_deref()),
        Commands::Source { action } => match action {
            SourceAction::Add {
                path,
                pattern,
                custom_id,
            } => cmd_source_add(
                &rt,
                db_path,
                path,
                pattern.unwrap_or(config.library.default_pattern),
                *custom_id,
            ),
            SourceAction::List => cmd_source_list(&rt, db_path),
        },
        Commands::Pattern { action } => match action {
            PatternAction::Add {
                name,
                artist_regex,
                artist_group,
                title_regex,
                title_group,
                song_id_regex,
                song_id_group,
            } => cmd_pattern_add(
                &rt,
                db_path,
                &crate::model::CustomPattern {
                    id: 0,
                    name: name.clone(),
                    artist_regex: artist_regex.clone(),
                    artist_group: *artist_group,
                    title_regex: title_regex.clone(),
                    title_group: *title_group,
                    song_id_regex: song_id_regex.clone(),
                    song_id_group: *song_id_group,
                },
            ),
            PatternAction::List => cmd_pattern_list(&rt, db_path),
        },
        Commands::Regulars { action } => match action {
            RegularsAction::List => cmd_regulars_list(&rt, db_path),
            RegularsAction::Add { name } => cmd_regulars_add(&rt, db_path, name),
            RegularsAction::Rename { name, new_name } => {
                cmd_regulars_rename(&rt, db_path, name, new_name)
            }
            RegularsAction::Remove { name } => cmd_regulars_remove(&rt, db_path, name),
            RegularsAction::AddSong {
                name,
                song,
                key_change,
            } => cmd_regulars_add_song(&rt, db_path, name, *song, *key_change),
            RegularsAction::Load { names, position } => {
                cmd_regulars_load(&rt, db_path, names, *position)
            }
        },
        Commands::CheckUpdates => cmd_check_updates(&rt, &config.updates),
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(config)?);
                Ok(())
            }
            ConfigAction::Init => {
                config::save(config)?;
                if let Some(path) = config::config_path() {
                    println!("Wrote {}", path.display());
                }
                Ok(())
            }
        },
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open (creating if needed) the library database.
pub(crate) async fn open_db(db_path: Option<&Path>) -> anyhow::Result<SqlitePool> {
    let url = db::db_url(db_path);
    db::init_db(&url)
        .await
        .with_context(|| format!("Failed to open database {url}"))
}

/// Absolute form of a user-supplied path, so it matches what scans store.
pub(crate) fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Cannot access {}", path.display()))
}
