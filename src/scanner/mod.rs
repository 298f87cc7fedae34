//! Source directory scanning.

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Extensions picked up by a scan (compared case-insensitively).
pub const KARAOKE_EXTENSIONS: [&str; 8] = ["zip", "cdg", "mkv", "avi", "wmv", "mp4", "mpg", "mpeg"];

/// Check if a path has a karaoke file extension.
pub fn is_karaoke_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| KARAOKE_EXTENSIONS.contains(&ext.as_str()))
}

/// Scans the given root directory recursively for karaoke files.
///
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_karaoke_file(entry.path()) {
                // Receiver dropped: stop walking
                if tx.blocking_send(entry.path().to_path_buf()).is_err() {
                    break;
                }
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}
