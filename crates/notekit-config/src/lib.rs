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

/// Editor settings. Every section falls back to its defaults when missing
/// from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub paste: PasteConfig,
    pub cards: CardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Undo depth; 0 means unlimited.
    pub max_levels: usize,
    /// Quiet period before a typing burst is committed.
    pub commit_delay_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: 500,
            commit_delay_ms: 400,
        }
    }
}

/// The editor's computed text defaults. Pasted styles equal to these are
/// redundant and get stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    pub default_color: String,
    pub default_background: String,
    pub default_font_size: String,
    /// Id prefix of wrapper elements copied out of another editor instance.
    pub foreign_root_prefix: String,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            default_color: "#000000".to_string(),
            default_background: "#ffffff".to_string(),
            default_font_size: "14px".to_string(),
            foreign_root_prefix: "am-engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Length of generated card ids.
    pub id_length: usize,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self { id_length: 8 }
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

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the user's config, falling back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
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
        let config_dir = shellexpand::tilde("~/.config/notekit");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}
