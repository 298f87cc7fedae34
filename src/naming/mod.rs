//! Filename naming patterns.
//!
//! Karaoke vendors name their files in a handful of fixed layouts
//! (`SC8123-04 - Artist - Title`, `Artist - Title`, `SID_Title_Artist`, ...).
//! Each source directory is tagged with one [`NamingPattern`], which is turned
//! into three [`FieldExtractor`]s for artist, title and song-ID. Directories
//! whose names don't follow any layout can use embedded tags instead
//! ([`NamingPattern::Metadata`]) or a user-defined set of regexes
//! ([`NamingPattern::Custom`]) stored in the library database.
//!
//! Field separators in the built-in layouts are a hyphen with one space or
//! underscore on each side, so hyphens inside song-IDs (`SC1001-01`) and
//! names (`Jay-Z`) survive.

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::model::CustomPattern;

/// Layout of the fields in a karaoke file's base name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPattern {
    /// `SongID - Title - Artist`
    SongIdTitleArtist,
    /// `SongID - Artist - Title`
    #[default]
    SongIdArtistTitle,
    /// `Artist - Title - SongID`
    ArtistTitleSongId,
    /// `Title - Artist - SongID`
    TitleArtistSongId,
    /// `Artist - Title`
    ArtistTitle,
    /// `Title - Artist`
    TitleArtist,
    /// `SongID_Title_Artist`
    SongIdTitleArtistUnderscore,
    /// Read artist/title/song-ID from embedded tags
    Metadata,
    /// User-defined regexes stored per source directory
    Custom,
}

impl NamingPattern {
    pub const ALL: [NamingPattern; 9] = [
        NamingPattern::SongIdTitleArtist,
        NamingPattern::SongIdArtistTitle,
        NamingPattern::ArtistTitleSongId,
        NamingPattern::TitleArtistSongId,
        NamingPattern::ArtistTitle,
        NamingPattern::TitleArtist,
        NamingPattern::SongIdTitleArtistUnderscore,
        NamingPattern::Metadata,
        NamingPattern::Custom,
    ];

    /// Stable integer code used for database storage.
    pub fn code(self) -> i64 {
        match self {
            NamingPattern::SongIdTitleArtist => 0,
            NamingPattern::SongIdArtistTitle => 1,
            NamingPattern::ArtistTitleSongId => 2,
            NamingPattern::TitleArtistSongId => 3,
            NamingPattern::ArtistTitle => 4,
            NamingPattern::TitleArtist => 5,
            NamingPattern::SongIdTitleArtistUnderscore => 6,
            NamingPattern::Metadata => 7,
            NamingPattern::Custom => 8,
        }
    }

    /// Inverse of [`NamingPattern::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    /// Human-readable layout, for listings.
    pub fn describe(self) -> &'static str {
        match self {
            NamingPattern::SongIdTitleArtist => "SongID - Title - Artist",
            NamingPattern::SongIdArtistTitle => "SongID - Artist - Title",
            NamingPattern::ArtistTitleSongId => "Artist - Title - SongID",
            NamingPattern::TitleArtistSongId => "Title - Artist - SongID",
            NamingPattern::ArtistTitle => "Artist - Title",
            NamingPattern::TitleArtist => "Title - Artist",
            NamingPattern::SongIdTitleArtistUnderscore => "SongID_Title_Artist",
            NamingPattern::Metadata => "Embedded tags",
            NamingPattern::Custom => "Custom pattern",
        }
    }
}

/// One regex and the capture group holding the field's value.
///
/// An unset extractor (no regex) behaves like a regex that never matches.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    regex: Option<Regex>,
    group: usize,
}

impl FieldExtractor {
    /// Compile `pattern`, taking capture group `group` on a match.
    pub fn new(pattern: &str, group: usize) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::pattern(pattern, e.to_string()))?;
        Ok(Self {
            regex: Some(regex),
            group,
        })
    }

    /// An extractor that always yields an empty string.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.regex.is_some()
    }

    /// Extract the field from `text`.
    ///
    /// Returns an empty string when the regex doesn't match or the group
    /// didn't participate. Underscores in the result become spaces.
    pub fn extract(&self, text: &str) -> String {
        let Some(regex) = &self.regex else {
            return String::new();
        };
        match regex.captures(text) {
            Ok(Some(caps)) => caps
                .get(self.group)
                .map(|m| m.as_str().replace('_', " "))
                .unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                // Backtrack limit and similar runtime failures
                warn!(target: "naming", text, error = %e, "Pattern match failed");
                String::new()
            }
        }
    }
}

/// Extractors for the three fields of one layout.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractors {
    pub artist: FieldExtractor,
    pub title: FieldExtractor,
    pub song_id: FieldExtractor,
}

impl FieldExtractors {
    /// True when no field has a regex, e.g. after a failed custom lookup.
    pub fn is_unset(&self) -> bool {
        !self.artist.is_set() && !self.title.is_set() && !self.song_id.is_set()
    }
}

/// How a file's fields are resolved.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Apply regexes to the base file name.
    Filename(FieldExtractors),
    /// Defer to embedded tags.
    Metadata,
}

impl Resolution {
    pub fn uses_metadata(&self) -> bool {
        matches!(self, Resolution::Metadata)
    }
}

/// Source of user-defined naming patterns.
pub trait PatternStore {
    /// Custom pattern id configured for a source directory, if any.
    fn custom_pattern_id(&self, source_path: &Path) -> Option<i64>;

    /// The custom pattern with the given id.
    fn custom_pattern(&self, id: i64) -> Option<CustomPattern>;
}

/// A [`PatternStore`] that knows no custom patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomPatterns;

impl PatternStore for NoCustomPatterns {
    fn custom_pattern_id(&self, _source_path: &Path) -> Option<i64> {
        None
    }

    fn custom_pattern(&self, _id: i64) -> Option<CustomPattern> {
        None
    }
}

/// In-memory snapshot of source-directory custom pattern ids and the
/// custom patterns they point at.
///
/// Loaded from the database before a scan so lookups during resolution are
/// synchronous.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    source_patterns: HashMap<PathBuf, i64>,
    patterns: HashMap<i64, CustomPattern>,
}

impl PatternCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_source_pattern(&mut self, source_path: impl Into<PathBuf>, pattern_id: i64) {
        self.source_patterns.insert(source_path.into(), pattern_id);
    }

    pub fn add_pattern(&mut self, pattern: CustomPattern) {
        self.patterns.insert(pattern.id, pattern);
    }
}

impl PatternStore for PatternCatalog {
    fn custom_pattern_id(&self, source_path: &Path) -> Option<i64> {
        self.source_patterns.get(source_path).copied()
    }

    fn custom_pattern(&self, id: i64) -> Option<CustomPattern> {
        self.patterns.get(&id).cloned()
    }
}

const SEP: &str = r"(?:\s|_)-(?:\s|_)";

fn builtin_extractors(artist: &str, title: &str, song_id: Option<&str>) -> FieldExtractors {
    let compile = |pattern: &str| {
        let pattern = pattern.replace("{SEP}", SEP);
        FieldExtractor::new(&pattern, 1).expect("built-in naming pattern compiles")
    };
    FieldExtractors {
        artist: compile(artist),
        title: compile(title),
        song_id: song_id.map(compile).unwrap_or_default(),
    }
}

// First segment: non-greedy up to the first separator.
// Middle of three: between the first separator and the last one.
// Last segment: greedy prefix, so everything after the final separator.
const LEADING_ID: &str = r"^(\S+?){SEP}";
const FIRST: &str = r"^(.+?){SEP}";
const MIDDLE_AFTER_ID: &str = r"^\S+?{SEP}(.+){SEP}.+$";
const TRAILING_AFTER_ID: &str = r"^\S+?{SEP}.+{SEP}(.+)$";
const MIDDLE_BEFORE_TRAILING: &str = r"^.+?{SEP}(.+){SEP}.+$";
const TRAILING: &str = r"^.+{SEP}(.+)$";
const AFTER_FIRST: &str = r"^.+?{SEP}(.+)$";

static BUILTIN: LazyLock<HashMap<NamingPattern, FieldExtractors>> = LazyLock::new(|| {
    HashMap::from([
        (
            NamingPattern::SongIdTitleArtist,
            builtin_extractors(TRAILING_AFTER_ID, MIDDLE_AFTER_ID, Some(LEADING_ID)),
        ),
        (
            NamingPattern::SongIdArtistTitle,
            builtin_extractors(MIDDLE_AFTER_ID, TRAILING_AFTER_ID, Some(LEADING_ID)),
        ),
        (
            NamingPattern::ArtistTitleSongId,
            builtin_extractors(FIRST, MIDDLE_BEFORE_TRAILING, Some(TRAILING)),
        ),
        (
            NamingPattern::TitleArtistSongId,
            builtin_extractors(MIDDLE_BEFORE_TRAILING, FIRST, Some(TRAILING)),
        ),
        (
            NamingPattern::ArtistTitle,
            builtin_extractors(FIRST, AFTER_FIRST, None),
        ),
        (
            NamingPattern::TitleArtist,
            builtin_extractors(AFTER_FIRST, FIRST, None),
        ),
        (
            NamingPattern::SongIdTitleArtistUnderscore,
            builtin_extractors(r"^[^_]+_[^_]+_(.+)$", r"^[^_]+_([^_]+)_", Some(r"^([^_]+)_")),
        ),
    ])
});

/// Build the resolution strategy for `pattern`.
///
/// `source_path` and `store` are only consulted for
/// [`NamingPattern::Custom`]. A custom directory without a valid pattern id
/// gets unset extractors (every field resolves to an empty string) and an
/// error is logged; a stored regex that fails to compile leaves only that
/// field unset.
pub fn select(pattern: NamingPattern, source_path: &Path, store: &dyn PatternStore) -> Resolution {
    match pattern {
        NamingPattern::Metadata => Resolution::Metadata,
        NamingPattern::Custom => Resolution::Filename(custom_extractors(source_path, store)),
        builtin => Resolution::Filename(BUILTIN.get(&builtin).cloned().unwrap_or_default()),
    }
}

fn custom_extractors(source_path: &Path, store: &dyn PatternStore) -> FieldExtractors {
    let pattern_id = store.custom_pattern_id(source_path).unwrap_or(0);
    if pattern_id < 1 {
        error!(
            target: "naming",
            source = %source_path.display(),
            pattern_id,
            "Custom pattern set for path, but pattern ID is invalid"
        );
        return FieldExtractors::default();
    }

    let Some(custom) = store.custom_pattern(pattern_id) else {
        warn!(target: "naming", pattern_id, "Custom pattern not found");
        return FieldExtractors::default();
    };

    FieldExtractors {
        artist: custom_field(&custom, "artist", &custom.artist_regex, custom.artist_group),
        title: custom_field(&custom, "title", &custom.title_regex, custom.title_group),
        song_id: custom_field(&custom, "song_id", &custom.song_id_regex, custom.song_id_group),
    }
}

fn custom_field(custom: &CustomPattern, field: &str, regex: &str, group: i64) -> FieldExtractor {
    let Ok(group) = usize::try_from(group) else {
        warn!(target: "naming", pattern = %custom.name, field, group, "Negative capture group");
        return FieldExtractor::unset();
    };
    FieldExtractor::new(regex, group).unwrap_or_else(|e| {
        warn!(target: "naming", pattern = %custom.name, field, error = %e, "Invalid custom regex");
        FieldExtractor::unset()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pattern: NamingPattern, base: &str) -> (String, String, String) {
        match select(pattern, Path::new("/karaoke"), &NoCustomPatterns) {
            Resolution::Filename(x) => (
                x.artist.extract(base),
                x.title.extract(base),
                x.song_id.extract(base),
            ),
            Resolution::Metadata => panic!("expected filename resolution"),
        }
    }

    fn strings(a: &str, t: &str, s: &str) -> (String, String, String) {
        (a.to_string(), t.to_string(), s.to_string())
    }

    fn custom(id: i64) -> CustomPattern {
        CustomPattern {
            id,
            name: "Vendor".to_string(),
            artist_regex: r"^\[(.+?)\]".to_string(),
            artist_group: 1,
            title_regex: r"\](.+?)\(".to_string(),
            title_group: 1,
            song_id_regex: r"(?<=\()[A-Z0-9]+(?=\))".to_string(),
            song_id_group: 0,
        }
    }

    #[test]
    fn test_song_id_title_artist() {
        assert_eq!(
            fields(NamingPattern::SongIdTitleArtist, "SC8123-04 - Song Title - Artist Name"),
            strings("Artist Name", "Song Title", "SC8123-04")
        );
    }

    #[test]
    fn test_song_id_artist_title() {
        assert_eq!(
            fields(NamingPattern::SongIdArtistTitle, "SC1001-01 - Jay-Z - Big Pimpin"),
            strings("Jay-Z", "Big Pimpin", "SC1001-01")
        );
    }

    #[test]
    fn test_artist_title_song_id() {
        assert_eq!(
            fields(NamingPattern::ArtistTitleSongId, "Artist Name - Song Title - SID123"),
            strings("Artist Name", "Song Title", "SID123")
        );
    }

    #[test]
    fn test_title_artist_song_id() {
        assert_eq!(
            fields(NamingPattern::TitleArtistSongId, "Song Title - Artist Name - PHM0405-02"),
            strings("Artist Name", "Song Title", "PHM0405-02")
        );
    }

    #[test]
    fn test_extra_separators_stay_in_the_middle_field() {
        assert_eq!(
            fields(NamingPattern::SongIdTitleArtist, "SC1 - Title - Part 2 - Artist"),
            strings("Artist", "Title - Part 2", "SC1")
        );
        assert_eq!(
            fields(NamingPattern::SongIdArtistTitle, "SC1 - Artist - Guest - Live"),
            strings("Artist - Guest", "Live", "SC1")
        );
        assert_eq!(
            fields(NamingPattern::ArtistTitleSongId, "Artist - Title - Part 2 - SC1"),
            strings("Artist", "Title - Part 2", "SC1")
        );
        assert_eq!(
            fields(NamingPattern::TitleArtistSongId, "Title - Artist - Guest - SC1"),
            strings("Artist - Guest", "Title", "SC1")
        );
    }

    #[test]
    fn test_artist_title() {
        assert_eq!(
            fields(NamingPattern::ArtistTitle, "Queen - Bohemian Rhapsody"),
            strings("Queen", "Bohemian Rhapsody", "")
        );
    }

    #[test]
    fn test_title_artist() {
        assert_eq!(
            fields(NamingPattern::TitleArtist, "Bohemian Rhapsody - Queen"),
            strings("Queen", "Bohemian Rhapsody", "")
        );
    }

    #[test]
    fn test_underscore_triplet() {
        assert_eq!(
            fields(
                NamingPattern::SongIdTitleArtistUnderscore,
                "SC8123_Song Title_Artist_Name"
            ),
            strings("Artist Name", "Song Title", "SC8123")
        );
    }

    #[test]
    fn test_underscores_become_spaces_in_every_field() {
        assert_eq!(
            fields(
                NamingPattern::SongIdArtistTitle,
                "SC1001_-_The_Artist_-_The_Title"
            ),
            strings("The Artist", "The Title", "SC1001")
        );
    }

    #[test]
    fn test_non_matching_name_is_empty() {
        assert_eq!(
            fields(NamingPattern::ArtistTitleSongId, "no separators here"),
            strings("", "", "")
        );
    }

    #[test]
    fn test_metadata_selects_tag_resolution() {
        let resolution = select(NamingPattern::Metadata, Path::new("/k"), &NoCustomPatterns);
        assert!(resolution.uses_metadata());
    }

    #[test]
    fn test_custom_pattern_from_catalog() {
        let mut catalog = PatternCatalog::new();
        catalog.add_pattern(custom(3));
        catalog.set_source_pattern("/karaoke/vendor", 3);

        let Resolution::Filename(x) =
            select(NamingPattern::Custom, Path::new("/karaoke/vendor"), &catalog)
        else {
            panic!("expected filename resolution");
        };
        let base = "[Some_Artist]Some Title(ABC123)";
        assert_eq!(x.artist.extract(base), "Some Artist");
        assert_eq!(x.title.extract(base), "Some Title");
        assert_eq!(x.song_id.extract(base), "ABC123");
    }

    #[test]
    fn test_custom_without_valid_id_is_unset() {
        let mut catalog = PatternCatalog::new();
        catalog.add_pattern(custom(3));
        catalog.set_source_pattern("/karaoke/vendor", 0);

        for path in ["/karaoke/vendor", "/karaoke/unknown"] {
            let Resolution::Filename(x) = select(NamingPattern::Custom, Path::new(path), &catalog)
            else {
                panic!("expected filename resolution");
            };
            assert!(x.is_unset());
            assert_eq!(x.artist.extract("Artist - Title"), "");
        }
    }

    #[test]
    fn test_custom_missing_row_is_unset() {
        let mut catalog = PatternCatalog::new();
        catalog.set_source_pattern("/karaoke/vendor", 9);
        let Resolution::Filename(x) =
            select(NamingPattern::Custom, Path::new("/karaoke/vendor"), &catalog)
        else {
            panic!("expected filename resolution");
        };
        assert!(x.is_unset());
    }

    #[test]
    fn test_custom_bad_regex_only_unsets_that_field() {
        let mut pattern = custom(4);
        pattern.title_regex = "(unclosed".to_string();
        let mut catalog = PatternCatalog::new();
        catalog.add_pattern(pattern);
        catalog.set_source_pattern("/k", 4);

        let Resolution::Filename(x) = select(NamingPattern::Custom, Path::new("/k"), &catalog)
        else {
            panic!("expected filename resolution");
        };
        assert!(!x.title.is_set());
        assert!(x.artist.is_set());
        assert_eq!(x.title.extract("[A]B(C)"), "");
        assert_eq!(x.artist.extract("[A]B(C)"), "A");
    }

    #[test]
    fn test_group_out_of_range_is_empty() {
        let extractor = FieldExtractor::new(r"^(\w+)", 5).unwrap();
        assert_eq!(extractor.extract("hello"), "");
    }

    #[test]
    fn test_invalid_regex_errors() {
        assert!(matches!(
            FieldExtractor::new("(unclosed", 0),
            Err(Error::Pattern { .. })
        ));
    }

    #[test]
    fn test_pattern_codes_round_trip() {
        for pattern in NamingPattern::ALL {
            assert_eq!(NamingPattern::from_code(pattern.code()), Some(pattern));
        }
        assert_eq!(NamingPattern::from_code(42), None);
    }
}
