//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\karaoke-minder\config.toml
//! - macOS: ~/Library/Application Support/karaoke-minder/config.toml
//! - Linux: ~/.config/karaoke-minder/config.toml
//!
//! The file is human-readable and may be edited by hand. Any section or
//! key left out falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::naming::NamingPattern;
use crate::update::UpdateChannel;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub updates: UpdateConfig,
    pub display: DisplayConfig,
}

/// Song library settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Database file (None = `karaoke_minder.db` in the working directory)
    pub database: Option<PathBuf>,

    /// Naming pattern offered for newly added source directories
    pub default_pattern: NamingPattern,
}

/// Update check settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub check_updates: bool,
    pub channel: UpdateChannel,

    /// Where the `<OS>-<channel>-curversion.txt` files live
    pub base_url: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            check_updates: true,
            channel: UpdateChannel::Stable,
            base_url: crate::update::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// CDG window and ticker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_cdg_window: bool,
    pub cdg_window_fullscreen: bool,
    pub fullscreen_monitor: u32,

    /// Ticker height in pixels
    pub ticker_height: u32,

    /// Ticker font description, e.g. "Sans,24"
    pub ticker_font: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_cdg_window: false,
            cdg_window_fullscreen: false,
            fullscreen_monitor: 0,
            ticker_height: 25,
            ticker_font: String::new(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("karaoke-minder"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)
}

/// Save configuration to `path`, creating its directory if needed.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write to temp, then rename
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[library]"));
        assert!(toml.contains("[updates]"));
        assert!(toml.contains("[display]"));
        assert!(toml.contains("default_pattern = \"song-id-artist-title\""));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.updates.check_updates);
        assert_eq!(config.updates.channel, UpdateChannel::Stable);
        assert_eq!(config.display.ticker_height, 25);
        assert!(config.library.database.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[updates]
channel = "unstable"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.updates.channel, UpdateChannel::Unstable);
        assert!(config.updates.check_updates);
        assert_eq!(config.library.default_pattern, NamingPattern::SongIdArtistTitle);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.library.database = Some(PathBuf::from("/srv/karaoke.db"));
        config.library.default_pattern = NamingPattern::Metadata;
        config.updates.check_updates = false;
        config.display.fullscreen_monitor = 2;
        config.display.ticker_font = "Sans,24".to_string();

        save_to(&config, &path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_unparseable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[library\nbroken").unwrap();
        assert_eq!(load_from(&path), Config::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_from(&dir.path().join("absent.toml")), Config::default());
    }
}
