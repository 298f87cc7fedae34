//! Karaoke file metadata resolution.
//!
//! A [`KaraokeFile`] resolves artist, title, song-ID and duration for one
//! file in a source directory. Fields come either from the base file name
//! through the directory's naming pattern, or from embedded tags when the
//! directory uses [`NamingPattern::Metadata`]. Everything is lazy: nothing
//! touches the disk until a field is asked for, tags are read at most once
//! per instance, and a positive duration is never recomputed.
//!
//! Failures never escape the getters. A file that can't be read resolves to
//! empty fields and a zero duration, with a warning logged, so a library
//! scan keeps going past one bad file.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use karaoke_minder::karaoke::KaraokeFile;
//! use karaoke_minder::metadata::LoftyTagReader;
//! use karaoke_minder::naming::{self, NamingPattern, NoCustomPatterns};
//!
//! let resolution = naming::select(NamingPattern::SongIdArtistTitle, root, &NoCustomPatterns);
//! let file = KaraokeFile::new("/k/SC1001-01 - Artist - Title.zip", resolution, Arc::new(LoftyTagReader));
//! println!("{} by {} ({} ms)", file.title(), file.artist(), file.duration_ms());
//! ```

use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::archive::KaraokeArchive;
use crate::cdg;
use crate::metadata::{MediaTags, TagReader};
use crate::naming::{self, NamingPattern, PatternStore, Resolution};

/// Value every tag field takes when tag resolution reaches a file type it
/// can't handle.
pub const ERROR_FIELD: &str = "Error";

/// Container kind, decided by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Zipped CDG + audio bundle
    Zip,
    /// Raw CDG stream with a companion audio file
    Cdg,
    /// Anything else (karaoke video, bare audio)
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("zip") => FileKind::Zip,
            Some("cdg") => FileKind::Cdg,
            _ => FileKind::Other,
        }
    }
}

/// Fields resolved from embedded tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TagFields {
    artist: String,
    title: String,
    song_id: String,
    duration_ms: u64,
}

impl TagFields {
    fn from_tags(tags: &MediaTags, duration_ms: u64) -> Self {
        Self {
            artist: tags.artist.clone(),
            title: tags.title.clone(),
            song_id: tags.song_id(),
            duration_ms,
        }
    }

    fn error() -> Self {
        Self {
            artist: ERROR_FIELD.to_string(),
            title: ERROR_FIELD.to_string(),
            song_id: ERROR_FIELD.to_string(),
            duration_ms: 0,
        }
    }
}

/// Fully resolved fields of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSong {
    pub artist: String,
    pub title: String,
    pub song_id: String,
    pub duration_ms: u64,
}

/// One karaoke file and its lazily resolved fields.
pub struct KaraokeFile {
    path: PathBuf,
    file_name: String,
    base_name: String,
    resolution: Resolution,
    reader: Arc<dyn TagReader>,
    tags: OnceCell<TagFields>,
    /// Result of the one container read for files that aren't zip or cdg
    container_duration: OnceCell<u64>,
    /// Zero until a positive duration is known
    duration_ms: Cell<u64>,
}

impl std::fmt::Debug for KaraokeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaraokeFile")
            .field("path", &self.path)
            .field("resolution", &self.resolution)
            .field("tags_read", &self.tags.get().is_some())
            .field("duration_ms", &self.duration_ms.get())
            .finish()
    }
}

impl KaraokeFile {
    pub fn new(path: impl Into<PathBuf>, resolution: Resolution, reader: Arc<dyn TagReader>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            file_name,
            base_name,
            resolution,
            reader,
            tags: OnceCell::new(),
            container_duration: OnceCell::new(),
            duration_ms: Cell::new(0),
        }
    }

    /// Build a file whose resolution comes from `pattern`.
    ///
    /// `source_path` is the source directory the file was found in; custom
    /// patterns are looked up by it.
    pub fn with_pattern(
        path: impl Into<PathBuf>,
        pattern: NamingPattern,
        source_path: &Path,
        store: &dyn PatternStore,
        reader: Arc<dyn TagReader>,
    ) -> Self {
        Self::new(path, naming::select(pattern, source_path, store), reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its last extension.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_path(&self.path)
    }

    pub fn artist(&self) -> String {
        match &self.resolution {
            Resolution::Metadata => self.tags().artist.clone(),
            Resolution::Filename(x) => x.artist.extract(&self.base_name),
        }
    }

    pub fn title(&self) -> String {
        match &self.resolution {
            Resolution::Metadata => self.tags().title.clone(),
            Resolution::Filename(x) => x.title.extract(&self.base_name),
        }
    }

    pub fn song_id(&self) -> String {
        match &self.resolution {
            Resolution::Metadata => self.tags().song_id.clone(),
            Resolution::Filename(x) => x.song_id.extract(&self.base_name),
        }
    }

    /// Playback duration in milliseconds, or 0 when it can't be determined.
    pub fn duration_ms(&self) -> u64 {
        let cached = self.duration_ms.get();
        if cached > 0 {
            return cached;
        }

        let duration = match self.kind() {
            FileKind::Zip => self.tags().duration_ms,
            FileKind::Cdg => cdg::file_duration(&self.path).unwrap_or_else(|e| {
                warn!(target: "karaoke", path = %self.path.display(), error = %e, "Unable to stat CDG file");
                0
            }),
            FileKind::Other => *self.container_duration.get_or_init(|| {
                match self.reader.read(&self.path) {
                    Ok(tags) => tags.duration_ms,
                    Err(e) => {
                        warn!(target: "karaoke", file = %self.base_name, error = %e, "Unable to get duration");
                        0
                    }
                }
            }),
        };

        self.duration_ms.set(duration);
        duration
    }

    /// Resolve every field at once.
    pub fn resolve(&self) -> ResolvedSong {
        ResolvedSong {
            artist: self.artist(),
            title: self.title(),
            song_id: self.song_id(),
            duration_ms: self.duration_ms(),
        }
    }

    fn tags(&self) -> &TagFields {
        self.tags.get_or_init(|| self.read_tags())
    }

    fn read_tags(&self) -> TagFields {
        debug!(target: "karaoke", path = %self.path.display(), "Reading tags");
        match self.kind() {
            FileKind::Cdg => self.read_cdg_tags(),
            FileKind::Zip => self.read_zip_tags(),
            FileKind::Other => {
                warn!(
                    target: "karaoke",
                    path = %self.path.display(),
                    "Tag resolution called on a file that is neither zip nor cdg"
                );
                TagFields::error()
            }
        }
    }

    fn read_cdg_tags(&self) -> TagFields {
        let Some(audio) = cdg::companion_audio(&self.path) else {
            warn!(target: "karaoke", path = %self.path.display(), "No companion audio for CDG file");
            return TagFields::default();
        };
        match self.reader.read(&audio) {
            Ok(tags) => TagFields::from_tags(&tags, tags.duration_ms),
            Err(e) => {
                warn!(target: "karaoke", path = %audio.display(), error = %e, "Unable to read tags");
                TagFields::default()
            }
        }
    }

    fn read_zip_tags(&self) -> TagFields {
        let mut archive = match KaraokeArchive::open(&self.path) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(target: "karaoke", path = %self.path.display(), error = %e, "Unable to open archive");
                return TagFields::default();
            }
        };
        let cdg_duration = archive.cdg_duration().unwrap_or(0);

        match archive.read_audio_tags(self.reader.as_ref()) {
            Ok(tags) => {
                let duration = if tags.duration_ms > 0 {
                    tags.duration_ms
                } else {
                    cdg_duration
                };
                TagFields::from_tags(&tags, duration)
            }
            Err(e) => {
                warn!(target: "karaoke", path = %self.path.display(), error = %e, "Unable to read archive audio tags");
                TagFields {
                    duration_ms: cdg_duration,
                    ..TagFields::default()
                }
            }
        }
    }
}
