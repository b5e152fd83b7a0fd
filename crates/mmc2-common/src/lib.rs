pub mod config;
pub mod logging;
pub mod paths;
pub mod registry;

pub const APP_NAME: &str = registry::NAME;

pub use config::{
    AppConfig, AppearanceConfig, ConfigError, LoggingConfig, NotificationConfig, StorageConfig,
};
pub use registry::{Constant, ConstantValue, settings, theme};
