//! Configuration loading and management
//!
//! Handles parsing of `tasklog.toml` configuration files. Configuration is
//! read-only input; the engine never writes state back to disk.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Field and input size limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Parser behavior
    #[serde(default)]
    pub parser: ParserConfig,

    /// Output rendering
    #[serde(default)]
    pub output: OutputConfig,

    /// Command history
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            parser: ParserConfig::default(),
            output: OutputConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Size limits for task fields and raw input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum title length in characters
    #[serde(default = "default_title_max")]
    pub title_max: usize,

    /// Maximum description length in characters
    #[serde(default = "default_description_max")]
    pub description_max: usize,

    /// Maximum length of a single tag
    #[serde(default = "default_tag_max")]
    pub tag_max: usize,

    /// Maximum number of tags per task
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Maximum raw input size in bytes
    #[serde(default = "default_input_max_bytes")]
    pub input_max_bytes: usize,
}

fn default_title_max() -> usize {
    256
}

fn default_description_max() -> usize {
    1024
}

fn default_tag_max() -> usize {
    32
}

fn default_max_tags() -> usize {
    10
}

fn default_input_max_bytes() -> usize {
    4096
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            title_max: default_title_max(),
            description_max: default_description_max(),
            tag_max: default_tag_max(),
            max_tags: default_max_tags(),
            input_max_bytes: default_input_max_bytes(),
        }
    }
}

/// Parser-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Maximum edit distance for verb suggestions
    #[serde(default = "default_max_suggestion_distance")]
    pub max_suggestion_distance: usize,

    /// Maximum number of suggestions returned for an unknown verb
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestion_distance() -> usize {
    2
}

fn default_max_suggestions() -> usize {
    3
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_suggestion_distance: default_max_suggestion_distance(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default theme name
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "plain".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

/// Command history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Default number of entries shown by `history`
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,
}

fn default_history_limit() -> usize {
    20
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
        }
    }
}

const CONFIG_FILE: &str = "tasklog.toml";

impl Config {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `tasklog.toml` from the working directory, or return defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = Path::new(CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.limits.title_max == 0 {
            return Err(Error::InvalidConfig(
                "limits.title_max must be at least 1".to_string(),
            ));
        }
        if self.limits.input_max_bytes == 0 {
            return Err(Error::InvalidConfig(
                "limits.input_max_bytes must be at least 1".to_string(),
            ));
        }
        if self.parser.max_suggestions == 0 {
            return Err(Error::InvalidConfig(
                "parser.max_suggestions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
