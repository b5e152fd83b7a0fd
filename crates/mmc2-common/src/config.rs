use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{self, settings, theme};

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_FONT_SIZE: u32 = 16;
const MIN_FONT_SIZE: u32 = 10;
const MAX_FONT_SIZE: u32 = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub appearance: AppearanceConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            auto_save: settings::AUTO_SAVE,
            auto_save_interval_ms: settings::AUTO_SAVE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_log_size")]
    pub max_log_size: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: settings::ENABLE_LOGGING,
            max_log_size: settings::MAX_LOG_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_true")]
    pub enable_animations: bool,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: theme::DEFAULT_THEME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            enable_animations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sound_effects: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_effects: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            appearance: AppearanceConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match env::var("MMC2_DATA_DIR") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => registry::app_data_dir(),
    }
}

fn default_true() -> bool {
    true
}

fn default_auto_save() -> bool {
    settings::AUTO_SAVE
}

fn default_auto_save_interval() -> u64 {
    settings::AUTO_SAVE_INTERVAL
}

fn default_logging_enabled() -> bool {
    settings::ENABLE_LOGGING
}

fn default_max_log_size() -> u64 {
    settings::MAX_LOG_SIZE
}

fn default_theme() -> String {
    theme::DEFAULT_THEME.to_string()
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("config has invalid value: {0}")]
    ValidationFailed(String),
}

impl AppConfig {
    pub fn resolve_path() -> PathBuf {
        if let Ok(path) = env::var("MMC2_CONFIG") {
            return PathBuf::from(path);
        }

        default_data_dir().join(DEFAULT_CONFIG_FILE)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, raw).map_err(|source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn load_or_create() -> Result<(Self, PathBuf, bool), ConfigError> {
        Self::load_or_create_at(&Self::resolve_path())
    }

    pub fn load_or_create_at(path: &Path) -> Result<(Self, PathBuf, bool), ConfigError> {
        if path.exists() {
            let cfg = Self::load(path)?;
            return Ok((cfg, path.to_path_buf(), false));
        }

        let cfg = Self::default();
        cfg.save(path)?;
        Ok((cfg, path.to_path_buf(), true))
    }

    /// Position of the configured theme in the theme catalogue.
    pub fn theme_index(&self) -> Option<usize> {
        registry::theme_index(&self.appearance.theme)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn validate_and_prepare(&self) -> Result<(), ConfigError> {
        self.validate()?;
        fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::WriteFailed {
            path: self.data_dir.clone(),
            source,
        })?;
        Ok(())
    }

    /// Checks every field without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "log_level cannot be empty".to_string(),
            ));
        }
        if self.storage.auto_save_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "storage.auto_save_interval_ms must be positive".to_string(),
            ));
        }
        if self.theme_index().is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "appearance.theme must be one of: {}",
                theme::AVAILABLE_THEMES.join(", ")
            )));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.appearance.font_size) {
            return Err(ConfigError::ValidationFailed(format!(
                "appearance.font_size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> AppConfig {
        AppConfig {
            data_dir: dir.join("data"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_follow_registry() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.auto_save, settings::AUTO_SAVE);
        assert_eq!(cfg.storage.auto_save_interval_ms, settings::AUTO_SAVE_INTERVAL);
        assert_eq!(cfg.logging.enabled, settings::ENABLE_LOGGING);
        assert_eq!(cfg.logging.max_log_size, settings::MAX_LOG_SIZE);
        assert_eq!(cfg.appearance.theme, theme::DEFAULT_THEME);
        assert_eq!(cfg.theme_index(), Some(0));
        assert_eq!(cfg.appearance.font_size, 16);
        assert!(cfg.notifications.enabled);
        assert!(!cfg.notifications.sound_effects);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("config.toml");
        let mut cfg = config_in(tmp.path());
        cfg.appearance.theme = "温柔紫".to_string();
        cfg.notifications.enabled = false;
        cfg.save(&path).expect("save");

        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_or_create_writes_defaults_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        let (_, _, created) = AppConfig::load_or_create_at(&path).expect("create");
        assert!(created);
        assert!(path.exists());
        let (_, _, created_again) = AppConfig::load_or_create_at(&path).expect("load");
        assert!(!created_again);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let raw = "data_dir = \"/tmp/mmc2\"\nlog_level = \"debug\"\n";
        let cfg: AppConfig = toml::from_str(raw).expect("parse");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.storage, StorageConfig::default());
        assert_eq!(cfg.appearance, AppearanceConfig::default());
    }

    #[test]
    fn validation_rejects_unknown_theme_and_font_size() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut cfg = config_in(tmp.path());
        cfg.appearance.theme = "米白".to_string();
        let err = cfg.validate_and_prepare().expect_err("unknown theme");
        assert!(err.to_string().contains("appearance.theme"));

        let mut cfg = config_in(tmp.path());
        cfg.appearance.font_size = 64;
        assert!(cfg.validate_and_prepare().is_err());

        let cfg = config_in(tmp.path());
        cfg.validate_and_prepare().expect("valid config");
        assert!(cfg.data_dir.is_dir());
    }
}
