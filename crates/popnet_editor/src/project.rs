// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project settings and document persistence.
//!
//! Settings live in a RON file next to the documents. POP documents are
//! stored as JSON and repaired on load.

use popnet_graph::{ColorStandard, Pop, RepairReport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "popnet.ron";

/// Default log filter directive
pub const DEFAULT_LOG_FILTER: &str = "popnet_editor=info";

/// Project I/O errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON
    #[error("Invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings are not valid RON
    #[error("Invalid settings: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Settings could not be written
    #[error("Failed to write settings: {0}")]
    RonWrite(#[from] ron::Error),

    /// Settings written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Project-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Format version
    pub version: u32,
    /// Project name
    pub name: String,
    /// Color standard for new documents
    pub color_standard: ColorStandard,
    /// Maximum undo depth
    pub history_depth: usize,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            name: "Untitled".to_string(),
            color_standard: ColorStandard::default(),
            history_depth: crate::history::MAX_HISTORY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ProjectSettings {
    /// Create settings for a named project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: ProjectSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings from a directory, falling back to defaults when absent
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = Self::settings_path(dir);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings file path for a project directory
    pub fn settings_path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE_NAME)
    }

    /// Empty document using these settings
    pub fn new_document(&self, name: impl Into<String>) -> Pop {
        let mut pop = Pop::new(name);
        pop.color_standard = self.color_standard;
        pop
    }
}

/// Read a document without repairing its connections. Port ids are
/// rebuilt from each device's structure.
pub fn read_document(path: &Path) -> Result<Pop> {
    let content = std::fs::read_to_string(path)?;
    let mut pop: Pop = serde_json::from_str(&content)?;
    pop.rederive_ports();
    Ok(pop)
}

/// Load a document and bring it back within its invariants
pub fn load_document(path: &Path) -> Result<(Pop, RepairReport)> {
    let mut pop = read_document(path)?;
    let report = pop.repair();
    tracing::info!("Loaded POP {} from {}", pop.name, path.display());
    Ok((pop, report))
}

/// Save a document as pretty JSON
pub fn save_document(path: &Path, pop: &Pop) -> Result<()> {
    let content = serde_json::to_string_pretty(pop)?;
    std::fs::write(path, content)?;
    tracing::info!("Saved POP {} to {}", pop.name, path.display());
    Ok(())
}
