//! Source directory and custom pattern commands.

use std::path::Path;

use anyhow::bail;
use tokio::runtime::Runtime;

use super::{absolute, open_db};
use crate::db;
use crate::model::CustomPattern;
use crate::naming::{FieldExtractor, NamingPattern};

/// Register a source directory
pub fn cmd_source_add(
    rt: &Runtime,
    db_path: Option<&Path>,
    path: &Path,
    pattern: NamingPattern,
    custom_id: Option<i64>,
) -> anyhow::Result<()> {
    let path = absolute(path)?;
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    if pattern == NamingPattern::Custom && custom_id.is_none() {
        bail!("--pattern custom needs --custom-id");
    }

    rt.block_on(async {
        let pool = open_db(db_path).await?;
        if let Some(id) = custom_id
            && db::get_custom_pattern(&pool, id).await?.is_none()
        {
            bail!("No custom pattern with ID {id}");
        }

        let custom_id = custom_id.filter(|_| pattern == NamingPattern::Custom);
        db::add_source_dir(&pool, &path.to_string_lossy(), pattern, custom_id).await?;
        println!("{} -> {}", path.display(), pattern.describe());
        anyhow::Ok(())
    })
}

/// List registered source directories
pub fn cmd_source_list(rt: &Runtime, db_path: Option<&Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        for dir in db::get_source_dirs(&pool).await? {
            match dir.custom_pattern_id {
                Some(id) => println!("{}  {} #{}", dir.path, dir.naming_pattern().describe(), id),
                None => println!("{}  {}", dir.path, dir.naming_pattern().describe()),
            }
        }
        anyhow::Ok(())
    })
}

/// Store a custom pattern after checking that its regexes compile
pub fn cmd_pattern_add(
    rt: &Runtime,
    db_path: Option<&Path>,
    pattern: &CustomPattern,
) -> anyhow::Result<()> {
    for (regex, group) in [
        (&pattern.artist_regex, pattern.artist_group),
        (&pattern.title_regex, pattern.title_group),
        (&pattern.song_id_regex, pattern.song_id_group),
    ] {
        if regex.is_empty() {
            continue;
        }
        let Ok(group) = usize::try_from(group) else {
            bail!("Capture group for {regex:?} must not be negative");
        };
        FieldExtractor::new(regex, group)?;
    }

    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let id = db::add_custom_pattern(&pool, pattern).await?;
        println!("Added pattern {:?} with ID {}", pattern.name, id);
        anyhow::Ok(())
    })
}

/// List stored custom patterns
pub fn cmd_pattern_list(rt: &Runtime, db_path: Option<&Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        for p in db::get_custom_patterns(&pool).await? {
            println!("#{} {}", p.id, p.name);
            println!("    artist:  {:?} (group {})", p.artist_regex, p.artist_group);
            println!("    title:   {:?} (group {})", p.title_regex, p.title_group);
            println!("    song ID: {:?} (group {})", p.song_id_regex, p.song_id_group);
        }
        anyhow::Ok(())
    })
}
