use super::{settings_path, ConfigError, Settings};
use crate::shared::fs_atomic::atomic_write_file;
use std::path::{Path, PathBuf};

pub fn save_settings(project_root: &Path, settings: &Settings) -> Result<PathBuf, ConfigError> {
    settings.validate()?;
    let path = settings_path(project_root);
    let body = serde_yaml::to_string(settings).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(&path, body.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}
