//! Regular singer commands.

use std::path::Path;

use anyhow::{Context, bail};
use sqlx::SqlitePool;
use tokio::runtime::Runtime;

use super::open_db;
use crate::db;
use crate::model::RegularSinger;
use crate::rotation::{AddPosition, Rotation};

async fn find_singer(pool: &SqlitePool, name: &str) -> anyhow::Result<RegularSinger> {
    db::get_regular_singer_by_name(pool, name)
        .await?
        .with_context(|| format!("No regular singer named {name:?}"))
}

/// List regular singers with their saved songs
pub fn cmd_regulars_list(rt: &Runtime, db_path: Option<&Path>) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        for singer in db::get_regular_singers(&pool).await? {
            let songs = db::get_regular_songs(&pool, singer.id).await?;
            println!("{} ({} songs)", singer.name, songs.len());
            for saved in songs {
                let label = match db::get_song_by_id(&pool, saved.song_id).await? {
                    Some(song) => format!("{} - {} [{}]", song.artist, song.title, song.song_id),
                    None => format!("<missing song {}>", saved.song_id),
                };
                if saved.key_change != 0 {
                    println!("    {} (key {:+})", label, saved.key_change);
                } else {
                    println!("    {}", label);
                }
            }
        }
        anyhow::Ok(())
    })
}

/// Create a regular singer
pub fn cmd_regulars_add(rt: &Runtime, db_path: Option<&Path>, name: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let id = db::create_regular_singer(&pool, name).await?;
        println!("Added regular singer {:?} (ID {})", name, id);
        anyhow::Ok(())
    })
}

/// Rename a regular singer
pub fn cmd_regulars_rename(
    rt: &Runtime,
    db_path: Option<&Path>,
    name: &str,
    new_name: &str,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let singer = find_singer(&pool, name).await?;
        db::rename_regular_singer(&pool, singer.id, new_name).await?;
        println!("Renamed {:?} to {:?}", name, new_name);
        anyhow::Ok(())
    })
}

/// Delete a regular singer
pub fn cmd_regulars_remove(rt: &Runtime, db_path: Option<&Path>, name: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let singer = find_singer(&pool, name).await?;
        db::delete_regular_singer(&pool, singer.id).await?;
        println!("Removed {:?}", name);
        anyhow::Ok(())
    })
}

/// Save a library song to a regular singer's list
pub fn cmd_regulars_add_song(
    rt: &Runtime,
    db_path: Option<&Path>,
    name: &str,
    song_id: i64,
    key_change: i64,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_db(db_path).await?;
        let singer = find_singer(&pool, name).await?;
        let Some(song) = db::get_song_by_id(&pool, song_id).await? else {
            bail!("No song with ID {song_id}");
        };
        db::add_regular_song(&pool, singer.id, song.id, key_change).await?;
        println!("Saved {} - {} for {}", song.artist, song.title, singer.name);
        anyhow::Ok(())
    })
}

/// Load regular singers into a fresh rotation and print it
pub fn cmd_regulars_load(
    rt: &Runtime,
    db_path: Option<&Path>,
    names: &[String],
    position: AddPosition,
) -> anyhow::Result<()> {
    let rotation = rt.block_on(async {
        let pool = open_db(db_path).await?;
        let mut rotation = Rotation::new();
        for name in names {
            let singer = find_singer(&pool, name).await?;
            let songs = db::get_regular_songs(&pool, singer.id).await?;
            if !rotation.add_regular(&singer, &songs, position) {
                eprintln!("{} is already in the rotation", singer.name);
            }
        }
        anyhow::Ok(rotation)
    })?;

    for (i, singer) in rotation.singers().iter().enumerate() {
        println!("{:>3}. {} ({} queued)", i + 1, singer.name, singer.queue.len());
    }
    Ok(())
}
