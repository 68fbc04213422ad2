use crate::config::ConfigError;
use std::path::{Path, PathBuf};

pub const JOBS_DIR_NAME: &str = "AutoGenJobs";
pub const SETTINGS_FILE_NAME: &str = "settings.yaml";
pub const PROJECT_ROOT_ENV: &str = "AUTOGEN_PROJECT_ROOT";

pub fn jobs_root(project_root: &Path) -> PathBuf {
    project_root.join(JOBS_DIR_NAME)
}

pub fn settings_path(project_root: &Path) -> PathBuf {
    jobs_root(project_root).join(SETTINGS_FILE_NAME)
}

pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return absolutize(path);
    }
    if let Some(raw) = std::env::var_os(PROJECT_ROOT_ENV).filter(|v| !v.is_empty()) {
        return absolutize(Path::new(&raw));
    }
    std::env::current_dir().map_err(|e| ConfigError::ProjectRoot(e.to_string()))
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ProjectRoot(e.to_string()))?;
    Ok(cwd.join(path))
}
