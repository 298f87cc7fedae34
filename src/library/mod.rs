use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{Error, Result, ResultExt};
use crate::karaoke::KaraokeFile;
use crate::metadata::TagReader;
use crate::naming::{self, NamingPattern, Resolution};
use crate::{db, scanner};

#[derive(Debug, Clone)]
pub enum ScanEvent {
    Processed(PathBuf),
    Error(PathBuf, String),
}

/// Everything needed to resolve files from one source directory.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub source: PathBuf,
    pub pattern: NamingPattern,
    pub resolution: Resolution,
}

/// Look up a registered source directory and build its resolution strategy.
///
/// Custom patterns are snapshotted from the database here so resolving
/// files during the scan never waits on a query.
pub async fn plan_scan(pool: &SqlitePool, source: &Path) -> Result<ScanPlan> {
    if !source.is_dir() {
        return Err(Error::not_found(source));
    }
    let key = source.to_string_lossy();
    let dir = db::get_source_dir_by_path(pool, &key)
        .await?
        .ok_or_else(|| Error::config(format!("{key} is not a registered source directory")))?;
    let catalog = db::load_pattern_catalog(pool)
        .await
        .with_context("loading custom patterns")?;
    let pattern = dir.naming_pattern();

    info!(target: "library::scan", source = %key, pattern = pattern.describe(), "Planned scan");

    Ok(ScanPlan {
        source: source.to_path_buf(),
        pattern,
        resolution: naming::select(pattern, source, &catalog),
    })
}

/// Scans a source directory and upserts every karaoke file found.
///
/// Files are resolved one at a time on the blocking pool. A file that fails
/// to resolve or store produces [`ScanEvent::Error`] and the scan moves on.
pub fn scan_library(
    pool: SqlitePool,
    plan: ScanPlan,
    reader: Arc<dyn TagReader>,
) -> impl Stream<Item = ScanEvent> {
    let ScanPlan {
        source, resolution, ..
    } = plan;

    scanner::scan(source).then(move |path| {
        let pool = pool.clone();
        let resolution = resolution.clone();
        let reader = reader.clone();
        async move {
            // Zip extraction and tag reads block
            let resolved = tokio::task::spawn_blocking({
                let path = path.clone();
                move || {
                    let file = KaraokeFile::new(path, resolution, reader);
                    (file.file_name().to_string(), file.resolve())
                }
            })
            .await;
            let (file_name, song) = match resolved {
                Ok(resolved) => resolved,
                Err(e) => return ScanEvent::Error(path, e.to_string()),
            };
            debug!(target: "library::scan", path = %path.display(), ?song, "Resolved");

            match db::upsert_song(&pool, &path.to_string_lossy(), &file_name, &song).await {
                Ok(_) => ScanEvent::Processed(path),
                Err(e) => ScanEvent::Error(path, e.to_string()),
            }
        }
    })
}

/// Remove songs under `source` whose files are gone. Returns how many
/// were removed.
pub async fn prune_missing(pool: &SqlitePool, source: &Path) -> Result<u64> {
    let mut removed = 0;
    for song in db::get_all_songs(pool).await? {
        let path = Path::new(&song.path);
        if path.starts_with(source) && !path.exists() {
            debug!(target: "library::scan", path = %song.path, "Removing missing song");
            if db::delete_song_by_path(pool, &song.path).await? {
                removed += 1;
            }
        }
    }
    if removed > 0 {
        info!(target: "library::scan", source = %source.display(), removed, "Pruned missing songs");
    }
    Ok(removed)
}
