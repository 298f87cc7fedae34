//! Core data models for the karaoke library.
//!
//! These are derived from SQLx for database mapping.
//!
//! # Database Schema
//!
//! The models map to the following tables:
//! - `sourcedirs` - Scanned directories and their naming pattern
//! - `custompatterns` - User-defined filename regexes
//! - `songs` - Individual karaoke files with resolved fields
//! - `regularsingers` / `regularsongs` - Singers tracked across events

use serde::Serialize;
use sqlx::FromRow;

use crate::naming::NamingPattern;

/// A karaoke file in the library.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Song {
    /// Database ID (auto-generated)
    pub id: i64,
    pub artist: String,
    pub title: String,
    /// Catalog/disc identifier
    pub song_id: String,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// File name including extension
    pub file_name: String,
    /// Absolute file path (unique identifier)
    pub path: String,
    /// RFC 3339 timestamp of the first scan that found this file
    pub added_at: String,
}

/// A directory scanned for karaoke files.
#[derive(Debug, Clone, FromRow)]
pub struct SourceDir {
    pub id: i64,
    pub path: String,
    /// [`NamingPattern::code`] value
    pub pattern: i64,
    /// Custom pattern id, only meaningful for [`NamingPattern::Custom`]
    pub custom_pattern_id: Option<i64>,
}

impl SourceDir {
    /// The decoded naming pattern; unknown codes fall back to the default.
    pub fn naming_pattern(&self) -> NamingPattern {
        NamingPattern::from_code(self.pattern).unwrap_or_default()
    }
}

/// User-defined filename regexes with a capture group per field.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CustomPattern {
    pub id: i64,
    pub name: String,
    pub artist_regex: String,
    pub artist_group: i64,
    pub title_regex: String,
    pub title_group: i64,
    pub song_id_regex: String,
    pub song_id_group: i64,
}

/// A singer tracked across events.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RegularSinger {
    pub id: i64,
    /// Unique name
    pub name: String,
}

/// A song saved to a regular singer's list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RegularSong {
    pub id: i64,
    pub singer_id: i64,
    /// Library song id
    pub song_id: i64,
    /// Key change in semitones
    pub key_change: i64,
    /// Order within the singer's list
    pub position: i64,
}
