//! Test utilities and fixtures for karaoke-minder tests.
//!
//! Common test helpers, mock factories, and database utilities to reduce
//! boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use karaoke_minder::test_utils::{temp_db, insert_mock_song};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let id = insert_mock_song(&pool, "/k/song.zip").await;
//!     // ... test logic
//! }
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::karaoke::ResolvedSong;
use crate::metadata::MediaTags;

/// Creates a temporary database for testing.
///
/// The database lives in a temporary directory that is cleaned up when the
/// returned `TempDir` is dropped. Keep the TempDir alive for the duration
/// of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Tags a mock reader hands back: 3:35 long, song-ID `SC8123-4`.
pub fn mock_media_tags() -> MediaTags {
    MediaTags {
        artist: "Tag Artist".to_string(),
        title: "Tag Title".to_string(),
        album: "SC8123".to_string(),
        track_number: Some(4),
        duration_ms: 215_000,
    }
}

/// A resolved song with sensible defaults. Customize with struct update
/// syntax.
pub fn mock_resolved_song() -> ResolvedSong {
    ResolvedSong {
        artist: "Test Artist".to_string(),
        title: "Test Title".to_string(),
        song_id: "SC8123-04".to_string(),
        duration_ms: 180_000,
    }
}

/// Inserts a mock song into the database and returns its ID.
pub async fn insert_mock_song(pool: &SqlitePool, path: &str) -> i64 {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    crate::db::upsert_song(pool, path, &file_name, &mock_resolved_song())
        .await
        .expect("Failed to insert song")
}

/// Write a zip at `path` holding zero-filled entries of the given sizes.
pub fn write_karaoke_zip(path: &Path, entries: &[(&str, usize)]) {
    let file = File::create(path).expect("Failed to create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, size) in entries {
        zip.start_file(*name, options).expect("Failed to start zip entry");
        zip.write_all(&vec![0u8; *size])
            .expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish zip");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;
        let songs = crate::db::get_all_songs(&pool).await.unwrap();
        assert!(songs.is_empty());
    }

    #[tokio::test]
    async fn test_insert_mock_song() {
        let (pool, _dir) = temp_db().await;

        let id = insert_mock_song(&pool, "/k/song.zip").await;
        assert!(id > 0);

        let songs = crate::db::get_all_songs(&pool).await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].file_name, "song.zip");
    }

    #[test]
    fn test_write_karaoke_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.zip");
        write_karaoke_zip(&path, &[("a.cdg", 10), ("a.mp3", 20)]);

        let archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
