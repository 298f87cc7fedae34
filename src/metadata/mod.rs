//! Embedded audio tag reading.
//!
//! Uses the lofty crate for format-independent metadata access. The
//! [`TagReader`] trait is the seam the karaoke resolver reads tags through,
//! so tests can count or fake reads without real audio files.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};

/// Tag fields a karaoke resolver cares about.
///
/// Missing text fields are empty strings rather than placeholders, since the
/// album doubles as the song-ID and a fake value would leak into the library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTags {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub track_number: Option<u32>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl MediaTags {
    /// Song-ID derived from tags: the album, plus `-<track>` when a track
    /// number is present.
    pub fn song_id(&self) -> String {
        match self.track_number {
            Some(track) => format!("{}-{}", self.album, track),
            None => self.album.clone(),
        }
    }
}

/// Reads embedded tags from a media file.
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<MediaTags>;
}

/// [`TagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<MediaTags> {
        read(path)
    }
}

/// Read tags and duration from the media file at `path`.
pub fn read(path: &Path) -> Result<MediaTags> {
    // Probe the file to determine format and read tags
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("failed to open for probing: {e}")))?
        .read()
        .map_err(|e| Error::metadata(path, format!("failed to read metadata: {e}")))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(MediaTags {
        artist: text_field(tag.and_then(|t| t.artist())),
        title: text_field(tag.and_then(|t| t.title())),
        album: text_field(tag.and_then(|t| t.album())),
        track_number: tag.and_then(|t| t.track()),
        duration_ms: tagged_file.properties().duration().as_millis() as u64,
    })
}

fn text_field(value: Option<Cow<'_, str>>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Test doubles for [`TagReader`].
#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns fixed tags and records every path it was asked to read.
    #[derive(Default)]
    pub struct MockTagReader {
        pub tags: MediaTags,
        pub fail: bool,
        calls: AtomicUsize,
        paths: Mutex<Vec<std::path::PathBuf>>,
    }

    impl MockTagReader {
        pub fn with_tags(tags: MediaTags) -> Self {
            Self {
                tags,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn paths(&self) -> Vec<std::path::PathBuf> {
            self.paths.lock().unwrap().clone()
        }
    }

    impl TagReader for MockTagReader {
        fn read(&self, path: &Path) -> Result<MediaTags> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(Error::metadata(path, "mock read failure"));
            }
            Ok(self.tags.clone())
        }
    }
}
