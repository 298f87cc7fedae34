//! Library scanning, listing and single-file inspection commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::Runtime;
use tracing::info;

use super::{absolute, open_db};
use crate::config::Config;
use crate::db;
use crate::karaoke::KaraokeFile;
use crate::library::{self, ScanEvent};
use crate::metadata::LoftyTagReader;
use crate::naming::NamingPattern;

/// Scan a registered source directory
pub fn cmd_scan(rt: &Runtime, db_path: Option<&Path>, path: &Path) -> anyhow::Result<()> {
    let source = absolute(path)?;
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let plan = library::plan_scan(&pool, &source).await?;
        println!(
            "Scanning {} ({})",
            source.display(),
            plan.pattern.describe()
        );

        let stream = library::scan_library(pool.clone(), plan, Arc::new(LoftyTagReader));
        let mut stream = std::pin::pin!(stream);
        let mut count = 0;
        let mut errors = 0;

        while let Some(event) = stream.next().await {
            match event {
                ScanEvent::Processed(_) => {
                    count += 1;
                    if count % 100 == 0 {
                        print!("\rScanned {} songs...", count);
                        std::io::stdout().flush()?;
                    }
                }
                ScanEvent::Error(p, e) => {
                    errors += 1;
                    eprintln!("\nError processing {:?}: {}", p, e);
                }
            }
        }

        let removed = library::prune_missing(&pool, &source).await?;
        info!(target: "library::scan", count, errors, removed, "Scan finished");
        println!(
            "\nScan complete. {} songs, {} errors, {} missing removed.",
            count, errors, removed
        );
        anyhow::Ok(())
    })
}

/// List songs in the library
pub fn cmd_list(
    rt: &Runtime,
    db_path: Option<&Path>,
    search: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let songs = match search {
            Some(term) => db::search_songs(&pool, term).await?,
            None => db::get_all_songs(&pool).await?,
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&songs)?);
            return anyhow::Ok(());
        }

        for song in &songs {
            println!(
                "{:<12} {} - {} [{}] {}",
                song.song_id,
                song.artist,
                song.title,
                format_duration(song.duration_ms),
                song.path
            );
        }
        println!("{} songs", songs.len());
        anyhow::Ok(())
    })
}

/// Resolve one file and print its fields
pub fn cmd_inspect(
    rt: &Runtime,
    db_path: Option<&Path>,
    config: &Config,
    file: &Path,
    pattern: Option<NamingPattern>,
    source: Option<&Path>,
) -> anyhow::Result<()> {
    let file = absolute(file)?;
    let source = match source {
        Some(s) => absolute(s)?,
        None => file.parent().map(Path::to_path_buf).unwrap_or_else(PathBuf::new),
    };

    let (pattern, catalog) = rt.block_on(async {
        let pool = open_db(db_path).await?;
        let registered = db::get_source_dir_by_path(&pool, &source.to_string_lossy()).await?;
        let pattern = pattern
            .or_else(|| registered.map(|dir| dir.naming_pattern()))
            .unwrap_or(config.library.default_pattern);
        let catalog = db::load_pattern_catalog(&pool).await?;
        anyhow::Ok((pattern, catalog))
    })?;

    let karaoke = KaraokeFile::with_pattern(
        &file,
        pattern,
        &source,
        &catalog,
        Arc::new(LoftyTagReader),
    );
    let song = karaoke.resolve();

    println!("File:     {}", karaoke.path().display());
    println!("Pattern:  {}", pattern.describe());
    println!("Artist:   {}", song.artist);
    println!("Title:    {}", song.title);
    println!("Song ID:  {}", song.song_id);
    println!(
        "Duration: {} ({} ms)",
        format_duration(song.duration_ms as i64),
        song.duration_ms
    );
    Ok(())
}

/// `m:ss` for listings
fn format_duration(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(215_999), "3:35");
        assert_eq!(format_duration(-5), "0:00");
    }
}
