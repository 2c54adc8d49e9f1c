// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Stored as JSON under the user config directory. Missing or unreadable
//! files fall back to defaults; unknown fields are ignored so older configs
//! keep loading.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::DEFAULT_SYMBOLOGIES;
use crate::source::EngineOptions;
use crate::types::{ScanRegion, Symbology};

/// Scan pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Symbologies the decode engine is asked to recognize
    pub symbologies: Vec<Symbology>,
    /// Which part of the frame the engine searches
    pub scan_region: ScanRegion,
    /// Last used camera device path, preferred at selection time
    pub last_camera_path: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbologies: DEFAULT_SYMBOLOGIES.to_vec(),
            scan_region: ScanRegion::default(),
            last_camera_path: None,
        }
    }
}

impl ScanConfig {
    /// Path of the config file under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("barscan").join("config.json"))
    }

    /// Load the config, falling back to defaults when absent or unreadable
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config");
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Persist to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::default_path()
            .ok_or_else(|| io::Error::other("no config directory for this user"))?;
        self.save_to(&path)
    }

    /// Persist to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Engine options derived from this configuration
    pub fn engine_options(&self) -> EngineOptions {
        let symbologies = if self.symbologies.is_empty() {
            // An empty set would make every engine inert; treat it as unset
            DEFAULT_SYMBOLOGIES.to_vec()
        } else {
            self.symbologies.clone()
        };
        EngineOptions {
            symbologies,
            region: self.scan_region,
        }
    }
}
