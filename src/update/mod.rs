//! New-version check.
//!
//! The download site publishes one small text file per OS and channel
//! (`<base>/<OS>-<channel>-curversion.txt`) holding the latest version as
//! `major.minor.revision`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::UpdateConfig;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://openkj.org/downloads";

/// Release channel to follow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UpdateChannel {
    #[default]
    Stable,
    Unstable,
}

impl UpdateChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateChannel::Stable => "stable",
            UpdateChannel::Unstable => "unstable",
        }
    }
}

/// Platform label used in download file names.
pub fn os_label() -> &'static str {
    if cfg!(all(windows, target_pointer_width = "64")) {
        "Win64"
    } else if cfg!(windows) {
        "Win32"
    } else if cfg!(target_os = "macos") {
        "MacOS"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else {
        "unknown"
    }
}

/// A `major.minor.revision` version. Ordering compares the fields in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Version of this build.
    pub fn current() -> Self {
        let part = |s: &str| s.parse().unwrap_or(0);
        Self::new(
            part(env!("CARGO_PKG_VERSION_MAJOR")),
            part(env!("CARGO_PKG_VERSION_MINOR")),
            part(env!("CARGO_PKG_VERSION_PATCH")),
        )
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::update(format!("invalid version info {s:?}"));
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match parts[..] {
            [major, minor, revision] => Ok(Self::new(major, minor, revision)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// URL of the version file for a platform and channel.
pub fn version_file_url(base_url: &str, os: &str, channel: UpdateChannel) -> String {
    format!(
        "{}/{}-{}-curversion.txt",
        base_url.trim_end_matches('/'),
        os,
        channel.as_str()
    )
}

/// Direct installer download. Only published for unstable Windows and macOS builds.
pub fn installer_url(os: &str, channel: UpdateChannel, version: Version) -> Option<String> {
    if channel != UpdateChannel::Unstable {
        return None;
    }
    match os {
        "Win64" => Some(format!(
            "http://openkj.org/downloads/unstable/Windows/OpenKJ-{version}-64bit-setup.exe"
        )),
        "Win32" => Some(format!(
            "http://openkj.org/downloads/unstable/Windows/OpenKJ-{version}-32bit-setup.exe"
        )),
        "MacOS" => Some(format!(
            "https://openkj.org/downloads/unstable/MacOS/OpenKJ-{version}-unstable-osx-installer.dmg"
        )),
        _ => None,
    }
}

/// Asks the download site whether a newer version exists.
pub struct UpdateChecker {
    http_client: reqwest::Client,
    base_url: String,
    os: &'static str,
    channel: UpdateChannel,
    enabled: bool,
}

impl UpdateChecker {
    pub fn new(config: &UpdateConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            os: os_label(),
            channel: config.channel,
            enabled: config.check_updates,
        }
    }

    pub fn os(&self) -> &'static str {
        self.os
    }

    pub fn channel(&self) -> UpdateChannel {
        self.channel
    }

    /// Fetch the published version and return it if newer than `current`.
    ///
    /// Returns `Ok(None)` without any request when checking is disabled, and
    /// when the server answers with something that isn't a version.
    pub async fn check_for_updates(&self, current: Version) -> Result<Option<Version>> {
        if !self.enabled {
            return Ok(None);
        }

        let url = version_file_url(&self.base_url, self.os, self.channel);
        info!(target: "update", %url, "Requesting current version info");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::update(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::update(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::update(e.to_string()))?;

        let available = match body.parse::<Version>() {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "update", "Got invalid version info from server: {}", e);
                return Ok(None);
            }
        };

        info!(target: "update", %available, %current, "Received version");
        Ok((available > current).then_some(available))
    }

    /// Installer link for `version` on this platform and channel.
    pub fn installer_url(&self, version: Version) -> Option<String> {
        installer_url(self.os, self.channel, version)
    }
}
