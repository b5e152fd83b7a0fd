use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Maps an entity id to `<dir>/<id>.<ext>`, refusing ids that would leave `dir`.
pub fn entity_file(dir: &Path, id: &str, ext: &str) -> Result<PathBuf> {
    Ok(dir.join(format!("{}.{ext}", checked_id(id)?)))
}

/// Maps an entity id to the subdirectory `<dir>/<id>`.
pub fn entity_dir(dir: &Path, id: &str) -> Result<PathBuf> {
    Ok(dir.join(checked_id(id)?))
}

/// Returns `id` unchanged when it is safe to use as a file or directory name.
pub fn checked_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        bail!("entity id cannot be empty");
    }
    if trimmed != id {
        bail!("entity id cannot have surrounding whitespace: {id:?}");
    }
    if id == "." || id == ".." || id.contains(['/', '\\', '\0']) || id.contains("..") {
        bail!("entity id escapes data directory: {id:?}");
    }
    Ok(id)
}

/// Appends `.json` unless the file name already ends with it (case-insensitive).
pub fn with_json_extension(path: &Path) -> PathBuf {
    let has_json = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(".json"))
        .unwrap_or(false);
    if has_json {
        return path.to_path_buf();
    }
    let mut raw = path.as_os_str().to_owned();
    raw.push(".json");
    PathBuf::from(raw)
}

pub fn expand_tilde(path: &str) -> String {
    if !path.starts_with('~') {
        return path.to_string();
    }
    let Some(home) = dirs::home_dir() else {
        return path.to_string();
    };
    if path == "~" {
        return home.display().to_string();
    }
    path.replacen('~', &home.display().to_string(), 1)
}
