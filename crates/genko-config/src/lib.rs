use genko_engine::settings::{AnalysisSettings, DEFAULT_BANNED_LEADING, LayoutSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk configuration. Every field has a default so a partial file loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `dictionary.json`.
    #[serde(default)]
    pub dictionary_dir: Option<PathBuf>,

    #[serde(default)]
    pub count_spaces: bool,
    #[serde(default = "default_true")]
    pub bracket_override_enabled: bool,
    #[serde(default = "default_true")]
    pub heading_classification_enabled: bool,

    #[serde(default = "default_geometry")]
    pub rows_per_page: usize,
    #[serde(default = "default_geometry")]
    pub cols: usize,
    #[serde(default = "default_true")]
    pub kinsoku_enabled: bool,
    /// Glyphs forbidden from starting a row, as one string.
    #[serde(default = "default_banned_leading")]
    pub banned_leading_chars: String,
}

fn default_true() -> bool {
    true
}

fn default_geometry() -> usize {
    20
}

fn default_banned_leading() -> String {
    DEFAULT_BANNED_LEADING.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_dir: None,
            count_spaces: false,
            bracket_override_enabled: true,
            heading_classification_enabled: true,
            rows_per_page: 20,
            cols: 20,
            kinsoku_enabled: true,
            banned_leading_chars: default_banned_leading(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded dictionary path
        config.dictionary_dir = config
            .dictionary_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/genko");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            count_spaces: self.count_spaces,
            bracket_override_enabled: self.bracket_override_enabled,
            heading_classification_enabled: self.heading_classification_enabled,
        }
    }

    pub fn layout_settings(&self) -> LayoutSettings {
        LayoutSettings {
            rows_per_page: self.rows_per_page,
            cols: self.cols,
            kinsoku_enabled: self.kinsoku_enabled,
            banned_leading_chars: self.banned_leading_chars.chars().collect(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
