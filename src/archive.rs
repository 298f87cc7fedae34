//! Zipped karaoke bundles.
//!
//! A bundle is a zip holding one CDG stream and its audio track. The audio
//! entry has to be extracted to disk before lofty can read it, so tag reads
//! go through a scoped temp dir that's removed as soon as the read returns.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::cdg;
use crate::metadata::{MediaTags, TagReader};

/// Audio extensions recognised inside a bundle, checked case-insensitively.
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "mov", "m4a", "flac"];

/// Errors from opening or extracting a bundle.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("Archive has no supported audio entry")]
    NoAudio,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    size: u64,
}

/// An opened karaoke zip with its CDG and audio entries located.
pub struct KaraokeArchive {
    path: PathBuf,
    zip: ZipArchive<BufReader<File>>,
    cdg: Option<Entry>,
    audio: Option<Entry>,
}

impl std::fmt::Debug for KaraokeArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KaraokeArchive")
            .field("path", &self.path)
            .field("cdg", &self.cdg)
            .field("audio", &self.audio)
            .finish()
    }
}

impl KaraokeArchive {
    /// Open the zip at `path` and locate the first CDG and audio entries.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let mut cdg = None;
        let mut audio = None;

        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let Some(ext) = entry_extension(&name) else {
                continue;
            };
            if cdg.is_none() && ext == "cdg" {
                cdg = Some(Entry {
                    name,
                    size: entry.size(),
                });
            } else if audio.is_none() && AUDIO_EXTENSIONS.contains(&ext.as_str()) {
                audio = Some(Entry {
                    name,
                    size: entry.size(),
                });
            }
        }

        debug!(
            target: "archive",
            path = %path.display(),
            cdg = ?cdg.as_ref().map(|e| &e.name),
            audio = ?audio.as_ref().map(|e| &e.name),
            "Opened karaoke archive"
        );

        Ok(Self {
            path: path.to_path_buf(),
            zip,
            cdg,
            audio,
        })
    }

    /// True when the bundle holds both a CDG stream and an audio track.
    pub fn is_valid(&self) -> bool {
        self.cdg.is_some() && self.audio.is_some()
    }

    /// Uncompressed size of the CDG entry.
    pub fn cdg_size(&self) -> Option<u64> {
        self.cdg.as_ref().map(|e| e.size)
    }

    /// Duration implied by the CDG entry's size, in milliseconds.
    pub fn cdg_duration(&self) -> Option<u64> {
        self.cdg_size().map(cdg::duration_from_size)
    }

    /// Extension of the audio entry including the leading dot, as stored
    /// in the archive (e.g. `.mp3`).
    pub fn audio_extension(&self) -> Option<String> {
        let audio = self.audio.as_ref()?;
        let ext = Path::new(&audio.name).extension()?.to_str()?;
        Some(format!(".{ext}"))
    }

    /// Extract the audio entry into `dir` as `file_name`.
    pub fn extract_audio(&mut self, dir: &Path, file_name: &str) -> Result<PathBuf, ArchiveError> {
        let name = self.audio.as_ref().ok_or(ArchiveError::NoAudio)?.name.clone();
        let mut entry = self.zip.by_name(&name)?;
        let dest = dir.join(file_name);
        let mut out = File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        Ok(dest)
    }

    /// Extract the audio entry to a temp dir and read its tags there.
    ///
    /// The temp dir lives only for the duration of this call.
    pub fn read_audio_tags(&mut self, reader: &dyn TagReader) -> crate::error::Result<MediaTags> {
        let ext = self.audio_extension().ok_or(ArchiveError::NoAudio)?;
        let dir = tempfile::tempdir()?;
        let audio = self.extract_audio(dir.path(), &format!("temp{ext}"))?;
        reader.read(&audio)
    }
}

fn entry_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::mocks::MockTagReader;
    use crate::test_utils::write_karaoke_zip;
    use tempfile::tempdir;

    #[test]
    fn test_open_locates_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SC1001-01 - Artist - Title.zip");
        write_karaoke_zip(&path, &[("Track.CDG", 96 * 75 * 3), ("Track.MP3", 64)]);

        let archive = KaraokeArchive::open(&path).unwrap();
        assert!(archive.is_valid());
        assert_eq!(archive.cdg_size(), Some(96 * 75 * 3));
        assert_eq!(archive.cdg_duration(), Some(3000));
        assert_eq!(archive.audio_extension().as_deref(), Some(".MP3"));
    }

    #[test]
    fn test_missing_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("only-graphics.zip");
        write_karaoke_zip(&path, &[("song.cdg", 96), ("readme.txt", 10)]);

        let mut archive = KaraokeArchive::open(&path).unwrap();
        assert!(!archive.is_valid());
        assert!(archive.audio_extension().is_none());
        assert!(matches!(
            archive.extract_audio(dir.path(), "temp.mp3"),
            Err(ArchiveError::NoAudio)
        ));
    }

    #[test]
    fn test_extract_audio_writes_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_karaoke_zip(&path, &[("song.cdg", 96), ("song.mp3", 128)]);

        let mut archive = KaraokeArchive::open(&path).unwrap();
        let out = tempdir().unwrap();
        let extracted = archive.extract_audio(out.path(), "temp.mp3").unwrap();
        assert_eq!(std::fs::metadata(&extracted).unwrap().len(), 128);
    }

    #[test]
    fn test_read_audio_tags_uses_temp_copy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_karaoke_zip(&path, &[("song.cdg", 96), ("song.ogg", 32)]);

        let reader = MockTagReader::default();
        let mut archive = KaraokeArchive::open(&path).unwrap();
        archive.read_audio_tags(&reader).unwrap();

        let paths = reader.paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].file_name().unwrap(), "temp.ogg");
        // Temp dir is gone once the read returns
        assert!(!paths[0].exists());
    }

    #[test]
    fn test_open_non_zip_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            KaraokeArchive::open(&path),
            Err(ArchiveError::Zip(_))
        ));
    }
}
