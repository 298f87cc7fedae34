//! CD+Graphics stream helpers.
//!
//! A CDG stream is a constant-rate sequence of 96-byte packet frames played
//! at 75 frames per second, so its length is known from its byte size alone.

use std::path::{Path, PathBuf};

/// Bytes in one CDG packet frame.
pub const CDG_BYTES_PER_FRAME: u64 = 96;

/// CDG frames played per second.
pub const CDG_FRAMES_PER_SECOND: u64 = 75;

/// Case variants tried when looking for the audio file paired with a CDG.
const COMPANION_AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "Mp3", "MP3", "mP3"];

/// Playback duration in milliseconds for a CDG stream of `size` bytes.
///
/// Each division truncates before the next one runs, so sizes that aren't a
/// whole number of seconds lose the partial second entirely.
pub fn duration_from_size(size: u64) -> u64 {
    ((size / CDG_BYTES_PER_FRAME) / CDG_FRAMES_PER_SECOND) * 1000
}

/// Duration in milliseconds of the CDG file at `path`.
pub fn file_duration(path: &Path) -> std::io::Result<u64> {
    Ok(duration_from_size(std::fs::metadata(path)?.len()))
}

/// Find the audio file that sits next to a CDG file.
///
/// Tries `mp3` in the case variants karaoke discs are commonly ripped with.
pub fn companion_audio(cdg_path: &Path) -> Option<PathBuf> {
    COMPANION_AUDIO_EXTENSIONS
        .iter()
        .map(|ext| cdg_path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}
