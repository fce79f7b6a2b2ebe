//! Settings file for the watched directory and its folder rules.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WatcherError};

/// Longest accepted folder label.
pub const MAX_LABEL_LEN: usize = 255;

/// Longest accepted extension, without the leading dot.
pub const MAX_EXTENSION_LEN: usize = 10;

/// Top-level settings.
///
/// ```yaml
/// source: /home/user/Downloads
/// folders:
///   - label: videos
///     path: /mnt/video
///     extensions: [mp4, mkv]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory to watch.
    pub source: PathBuf,

    /// Destination rules, in priority order.
    pub folders: Vec<FolderRule>,
}

/// One destination and the extensions routed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRule {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Local directory, `http(s)://` URL or `ftp://` URL.
    pub path: String,

    /// Extensions routed to `path`; case-insensitive, leading dot optional.
    pub extensions: Vec<String>,
}

impl FolderRule {
    pub fn new(path: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            label: None,
            path: path.into(),
            extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn validate(&self, index: usize) -> Result<()> {
        let name = self
            .label
            .clone()
            .unwrap_or_else(|| format!("folders[{index}]"));

        if let Some(label) = &self.label
            && label.chars().count() > MAX_LABEL_LEN
        {
            return Err(WatcherError::Config(format!(
                "{name}: label is longer than {MAX_LABEL_LEN} characters"
            )));
        }

        if self.path.trim().is_empty() {
            return Err(WatcherError::Config(format!("{name}: path is empty")));
        }

        if self.extensions.is_empty() {
            return Err(WatcherError::Config(format!("{name}: no extensions")));
        }

        for extension in &self.extensions {
            let trimmed = extension.trim().trim_start_matches('.');
            if trimmed.is_empty() {
                return Err(WatcherError::Config(format!("{name}: empty extension")));
            }
            if trimmed.chars().count() > MAX_EXTENSION_LEN {
                return Err(WatcherError::Config(format!(
                    "{name}: extension « {extension} » is longer than {MAX_EXTENSION_LEN} characters"
                )));
            }
        }

        Ok(())
    }
}

impl Settings {
    /// Read and validate a `.yaml`/`.yml` settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if !is_yaml {
            return Err(WatcherError::Config(format!(
                "settings file must be a .yaml or .yml file: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        settings.validate()?;

        debug!(
            path = %path.display(),
            folders = settings.folders.len(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Check the invariants the pipeline relies on.
    ///
    /// Local destinations are not required to exist: a missing one is a
    /// delivery failure for each file, not a startup error.
    pub fn validate(&self) -> Result<()> {
        if !self.source.exists() {
            return Err(WatcherError::DirectoryNotFound(
                self.source.display().to_string(),
            ));
        }
        if !self.source.is_dir() {
            return Err(WatcherError::NotADirectory(self.source.display().to_string()));
        }

        if self.folders.is_empty() {
            return Err(WatcherError::Config("at least one folder is required".to_string()));
        }

        for (index, folder) in self.folders.iter().enumerate() {
            folder.validate(index)?;
        }

        Ok(())
    }
}
