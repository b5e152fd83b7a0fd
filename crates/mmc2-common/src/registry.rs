//! Process-wide named constants: application identity, on-disk conventions,
//! numeric limits, and the theme catalogue.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const NAME: &str = "MMC2";
pub const VERSION: &str = "2.0-new";
pub const FULL_NAME: &str = "Multi-ConsciousChat 2";
pub const WRITER1: &str = "xingtuan";
pub const WRITER2: &str = "yunxi";
pub const ANOTHER_NAME: &str = "yunxi and xingtuan";
pub const COPYRIGHT: &str = "©2025 MMC2 Team. All rights reserved.";
pub const DESCRIPTION: &str = "为多意识体系统提供友好交流平台的应用程序";
pub const WEBSITE: &str = "https://github.com/mmc2/multi-conscious-chat";
pub const ICON_PATH: &str = "/img/MMC2.ico";
pub const DATA_EXPORT_FORMAT: &str = "JSON";
pub const DATA_IMPORT_FORMAT: &str = "JSON";
pub const CONFIG_FILE: &str = "system.yaml";
/// Subdirectory of the user's home that holds all application data.
pub const APP_DATA_DIR_NAME: &str = ".mmc2";

/// Runtime defaults and hard limits.
pub mod settings {
    pub const AUTO_SAVE: bool = true;
    /// Milliseconds between automatic saves.
    pub const AUTO_SAVE_INTERVAL: u64 = 30_000;
    pub const ENABLE_LOGGING: bool = true;
    /// Bytes; 10 MiB.
    pub const MAX_LOG_SIZE: u64 = 10_485_760;
    pub const MAX_CONVERSATION_MESSAGES: usize = 1_000;
    pub const MAX_MEMBERS: usize = 50;
}

pub mod theme {
    pub const DEFAULT_THEME: &str = "默认蓝";
    pub const AVAILABLE_THEMES: [&str; 5] = ["默认蓝", "温柔紫", "自然绿", "温暖橙", "深邃夜"];
}

static APP_DATA_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DATA_DIR_NAME)
});

/// `<home>/.mmc2`, resolved once per process.
pub fn app_data_dir() -> PathBuf {
    APP_DATA_DIR.clone()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    List(&'static [&'static str]),
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Flag(value) => write!(f, "{value}"),
            Self::List(values) => f.write_str(&values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: &'static str,
    pub value: ConstantValue,
}

impl Constant {
    fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: ConstantValue::Text(value.into()),
        }
    }

    fn integer(name: &'static str, value: i64) -> Self {
        Self {
            name,
            value: ConstantValue::Integer(value),
        }
    }

    fn flag(name: &'static str, value: bool) -> Self {
        Self {
            name,
            value: ConstantValue::Flag(value),
        }
    }
}

static REGISTRY: LazyLock<Vec<Constant>> = LazyLock::new(|| {
    vec![
        Constant::text("NAME", NAME),
        Constant::text("VERSION", VERSION),
        Constant::text("FULL_NAME", FULL_NAME),
        Constant::text("WRITER1", WRITER1),
        Constant::text("WRITER2", WRITER2),
        Constant::text("ANOTHER_NAME", ANOTHER_NAME),
        Constant::text("COPYRIGHT", COPYRIGHT),
        Constant::text("DESCRIPTION", DESCRIPTION),
        Constant::text("WEBSITE", WEBSITE),
        Constant::text("ICON_PATH", ICON_PATH),
        Constant::text("DATA_EXPORT_FORMAT", DATA_EXPORT_FORMAT),
        Constant::text("DATA_IMPORT_FORMAT", DATA_IMPORT_FORMAT),
        Constant::text("CONFIG_FILE", CONFIG_FILE),
        Constant::text("APP_DATA_DIR_NAME", APP_DATA_DIR_NAME),
        Constant::text("APP_DATA_DIR", app_data_dir().display().to_string()),
        Constant::flag("Config.AUTO_SAVE", settings::AUTO_SAVE),
        Constant::integer(
            "Config.AUTO_SAVE_INTERVAL",
            settings::AUTO_SAVE_INTERVAL as i64,
        ),
        Constant::flag("Config.ENABLE_LOGGING", settings::ENABLE_LOGGING),
        Constant::integer("Config.MAX_LOG_SIZE", settings::MAX_LOG_SIZE as i64),
        Constant::integer(
            "Config.MAX_CONVERSATION_MESSAGES",
            settings::MAX_CONVERSATION_MESSAGES as i64,
        ),
        Constant::integer("Config.MAX_MEMBERS", settings::MAX_MEMBERS as i64),
        Constant::text("Theme.DEFAULT_THEME", theme::DEFAULT_THEME),
        Constant {
            name: "Theme.AVAILABLE_THEMES",
            value: ConstantValue::List(&theme::AVAILABLE_THEMES),
        },
    ]
});

/// Every constant in declaration order.
pub fn entries() -> &'static [Constant] {
    &REGISTRY
}

pub fn lookup(name: &str) -> Option<&'static Constant> {
    REGISTRY.iter().find(|c| c.name == name)
}

pub fn theme_index(name: &str) -> Option<usize> {
    theme::AVAILABLE_THEMES
        .iter()
        .position(|candidate| *candidate == name.trim())
}

pub fn theme_name(index: usize) -> Option<&'static str> {
    theme::AVAILABLE_THEMES.get(index).copied()
}
