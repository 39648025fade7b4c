// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings.
//!
//! Read from a RON file (`chill.ron` by default). A missing file yields the
//! defaults; a malformed one is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "chill.ron";

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Filesystem failure
    #[error("Failed to access settings: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed file
    #[error("Invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failure
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Settings version {0} is newer than supported version {SETTINGS_FORMAT_VERSION}")]
    UnsupportedVersion(u32),
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Format version
    pub version: u32,
    /// Directories scanned for node definitions
    pub node_dirs: Vec<PathBuf>,
    /// Slicer executable
    pub slicer_path: Option<PathBuf>,
    /// Extra slicer arguments, placed before the program path
    pub slicer_args: Vec<String>,
    /// File name of the exported program, next to the document
    pub export_file: String,
    /// Maximum number of undo steps
    pub history_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            node_dirs: vec![PathBuf::from("nodes")],
            slicer_path: None,
            slicer_args: Vec::new(),
            export_file: "chill_program.lua".to_string(),
            history_depth: 100,
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&content)?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion(settings.version));
        }
        Ok(settings)
    }

    /// Load settings, falling back to the defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where the exported program for a document goes
    pub fn export_path(&self, document: &Path) -> PathBuf {
        document
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.export_file)
    }
}
