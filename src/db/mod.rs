//! Database module for the karaoke library.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Source directories and their naming patterns
//! - Custom filename patterns
//! - Song upserts and lookups after a scan
//! - Regular singers and their saved songs
//!
//! # Example
//!
//! ```ignore
//! use karaoke_minder::db::{init_db, get_all_songs};
//!
//! let pool = init_db("sqlite:karaoke_minder.db").await?;
//! let songs = get_all_songs(&pool).await?;
//! ```

use std::path::Path;

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{Error, Result};
use crate::karaoke::ResolvedSong;
use crate::model::{CustomPattern, RegularSinger, RegularSong, Song, SourceDir};
use crate::naming::{NamingPattern, PatternCatalog};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "karaoke_minder.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
pub async fn init_db(db_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

// ============================================================================
// Source directories
// ============================================================================

/// Register a source directory, or update its pattern if already known.
pub async fn add_source_dir(
    pool: &SqlitePool,
    path: &str,
    pattern: NamingPattern,
    custom_pattern_id: Option<i64>,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO sourcedirs (path, pattern, custom_pattern_id)
        VALUES (?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            pattern = excluded.pattern,
            custom_pattern_id = excluded.custom_pattern_id
        RETURNING id
        "#,
    )
    .bind(path)
    .bind(pattern.code())
    .bind(custom_pattern_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn get_source_dirs(pool: &SqlitePool) -> sqlx::Result<Vec<SourceDir>> {
    sqlx::query_as::<_, SourceDir>(
        "SELECT id, path, pattern, custom_pattern_id FROM sourcedirs ORDER BY path",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_source_dir_by_path(
    pool: &SqlitePool,
    path: &str,
) -> sqlx::Result<Option<SourceDir>> {
    sqlx::query_as::<_, SourceDir>(
        "SELECT id, path, pattern, custom_pattern_id FROM sourcedirs WHERE path = ?",
    )
    .bind(path)
    .fetch_optional(pool)
    .await
}

// ============================================================================
// Custom patterns
// ============================================================================

/// Store a custom pattern. The `id` field of `pattern` is ignored.
pub async fn add_custom_pattern(pool: &SqlitePool, pattern: &CustomPattern) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO custompatterns
            (name, artist_regex, artist_group, title_regex, title_group, song_id_regex, song_id_group)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pattern.name)
    .bind(&pattern.artist_regex)
    .bind(pattern.artist_group)
    .bind(&pattern.title_regex)
    .bind(pattern.title_group)
    .bind(&pattern.song_id_regex)
    .bind(pattern.song_id_group)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_custom_pattern(
    pool: &SqlitePool,
    id: i64,
) -> sqlx::Result<Option<CustomPattern>> {
    sqlx::query_as::<_, CustomPattern>("SELECT * FROM custompatterns WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_custom_patterns(pool: &SqlitePool) -> sqlx::Result<Vec<CustomPattern>> {
    sqlx::query_as::<_, CustomPattern>("SELECT * FROM custompatterns ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Snapshot every source directory's custom pattern id and every custom
/// pattern for synchronous lookups during a scan.
pub async fn load_pattern_catalog(pool: &SqlitePool) -> sqlx::Result<PatternCatalog> {
    let mut catalog = PatternCatalog::new();
    for dir in get_source_dirs(pool).await? {
        if let Some(id) = dir.custom_pattern_id {
            catalog.set_source_pattern(dir.path, id);
        }
    }
    for pattern in get_custom_patterns(pool).await? {
        catalog.add_pattern(pattern);
    }
    Ok(catalog)
}

// ============================================================================
// Songs
// ============================================================================

/// Insert or update a song by path.
///
/// `added_at` is set on first insert and kept on later updates.
pub async fn upsert_song(
    pool: &SqlitePool,
    path: &str,
    file_name: &str,
    song: &ResolvedSong,
) -> sqlx::Result<i64> {
    let added_at = chrono::Utc::now().to_rfc3339();
    let duration = song.duration_ms as i64;

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO songs (artist, title, song_id, duration_ms, file_name, path, added_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            artist = excluded.artist,
            title = excluded.title,
            song_id = excluded.song_id,
            duration_ms = excluded.duration_ms,
            file_name = excluded.file_name
        RETURNING id
        "#,
    )
    .bind(&song.artist)
    .bind(&song.title)
    .bind(&song.song_id)
    .bind(duration)
    .bind(file_name)
    .bind(path)
    .bind(added_at)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn get_all_songs(pool: &SqlitePool) -> sqlx::Result<Vec<Song>> {
    sqlx::query_as::<_, Song>("SELECT * FROM songs ORDER BY artist, title")
        .fetch_all(pool)
        .await
}

/// Songs whose artist, title or song-ID contains `term` (case-insensitive).
pub async fn search_songs(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Song>> {
    let like = format!("%{}%", term);
    sqlx::query_as::<_, Song>(
        r#"
        SELECT * FROM songs
        WHERE artist LIKE ?1 OR title LIKE ?1 OR song_id LIKE ?1
        ORDER BY artist, title
        "#,
    )
    .bind(like)
    .fetch_all(pool)
    .await
}

pub async fn get_song_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_song_by_path(pool: &SqlitePool, path: &str) -> sqlx::Result<Option<Song>> {
    sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE path = ?")
        .bind(path)
        .fetch_optional(pool)
        .await
}

/// Delete a song by path. Returns true if a row was removed.
pub async fn delete_song_by_path(pool: &SqlitePool, path: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE path = ?")
        .bind(path)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Regular singers
// ============================================================================

/// Create a regular singer. Fails with [`Error::DuplicateSinger`] if the
/// name is taken.
pub async fn create_regular_singer(pool: &SqlitePool, name: &str) -> Result<i64> {
    if get_regular_singer_by_name(pool, name).await?.is_some() {
        return Err(Error::DuplicateSinger(name.to_string()));
    }
    let result = sqlx::query("INSERT INTO regularsingers (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_regular_singers(pool: &SqlitePool) -> sqlx::Result<Vec<RegularSinger>> {
    sqlx::query_as::<_, RegularSinger>("SELECT id, name FROM regularsingers ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn get_regular_singer_by_name(
    pool: &SqlitePool,
    name: &str,
) -> sqlx::Result<Option<RegularSinger>> {
    sqlx::query_as::<_, RegularSinger>("SELECT id, name FROM regularsingers WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
}

/// Rename a regular singer. Renaming onto another singer's name is
/// rejected and leaves the record unchanged.
pub async fn rename_regular_singer(pool: &SqlitePool, id: i64, new_name: &str) -> Result<()> {
    if let Some(existing) = get_regular_singer_by_name(pool, new_name).await?
        && existing.id != id
    {
        return Err(Error::DuplicateSinger(new_name.to_string()));
    }
    sqlx::query("UPDATE regularsingers SET name = ? WHERE id = ?")
        .bind(new_name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a regular singer and their saved songs.
pub async fn delete_regular_singer(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM regularsongs WHERE singer_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM regularsingers WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Append a song to a regular singer's list.
pub async fn add_regular_song(
    pool: &SqlitePool,
    singer_id: i64,
    song_id: i64,
    key_change: i64,
) -> sqlx::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO regularsongs (singer_id, song_id, key_change, position)
        VALUES (?1, ?2, ?3,
            (SELECT COALESCE(MAX(position), -1) + 1 FROM regularsongs WHERE singer_id = ?1))
        RETURNING id
        "#,
    )
    .bind(singer_id)
    .bind(song_id)
    .bind(key_change)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// A regular singer's saved songs in list order.
pub async fn get_regular_songs(pool: &SqlitePool, singer_id: i64) -> sqlx::Result<Vec<RegularSong>> {
    sqlx::query_as::<_, RegularSong>(
        "SELECT id, singer_id, song_id, key_change, position FROM regularsongs WHERE singer_id = ? ORDER BY position",
    )
    .bind(singer_id)
    .fetch_all(pool)
    .await
}
