use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "mmc2.log";

fn filter_for(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(log_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs to `<logs_dir>/mmc2.log`, rotating an oversized file to `mmc2.log.1` first.
pub fn init_with_file(log_level: &str, logs_dir: &Path, max_size: u64) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs dir {}", logs_dir.display()))?;
    let path = logs_dir.join(LOG_FILE_NAME);
    rotate_if_oversized(&path, max_size)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(log_level))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(path)
}

/// Returns true when the file was moved aside.
pub fn rotate_if_oversized(path: &Path, max_size: u64) -> Result<bool> {
    let Ok(meta) = fs::metadata(path) else {
        return Ok(false);
    };
    if meta.len() <= max_size {
        return Ok(false);
    }
    let mut rotated = path.as_os_str().to_owned();
    rotated.push(".1");
    fs::rename(path, &rotated)
        .with_context(|| format!("failed to rotate log file {}", path.display()))?;
    Ok(true)
}
