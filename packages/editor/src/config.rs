use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo levels (0 = unlimited)
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeConfig {
    /// Upper bound on repair passes per section in live mode
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Capacity of the upload event channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// What happens to a placeholder whose upload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the node in place and report it as failed until retried
    #[default]
    Mark,
    /// Drop the node from the tree
    Remove,
}

fn default_max_undo_levels() -> usize {
    100
}

fn default_max_passes() -> usize {
    16
}

fn default_channel_capacity() -> usize {
    256
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = Self::path_in(dir);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_NAME)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: default_max_undo_levels(),
            normalize: NormalizeConfig::default(),
            uploads: UploadConfig::default(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}
