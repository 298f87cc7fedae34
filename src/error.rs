//! Error types shared across the crate.
//!
//! Subsystems with their own failure modes get a `thiserror` enum (such as
//! [`ArchiveError`]) that converts into [`Error`]. The CLI wraps everything
//! in `anyhow`.
//!
//! The karaoke file resolver never surfaces these from its getters. A file
//! that can't be read is logged and resolved to empty (or `"Error"`) fields
//! so a library scan keeps going.

use std::path::PathBuf;

pub use crate::archive::ArchiveError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Tag reading error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Zipped karaoke bundle error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Filename pattern failed to compile
    #[error("Invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// Regular singer name already taken
    #[error("A regular singer named {0:?} already exists")]
    DuplicateSinger(String),

    /// Rotation bookkeeping error
    #[error("Rotation error: {0}")]
    Rotation(String),

    /// Update check error
    #[error("Update check error: {0}")]
    Update(String),

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a rotation error.
    pub fn rotation(message: impl Into<String>) -> Self {
        Self::Rotation(message.into())
    }

    /// Create an update check error.
    pub fn update(message: impl Into<String>) -> Self {
        Self::Update(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
