use super::{settings_path, ConfigError, Settings};
use std::path::Path;

pub fn load_settings(project_root: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path(project_root);
    let settings = if path.exists() {
        Settings::from_path(&path)?
    } else {
        Settings::default()
    };
    settings.validate()?;
    Ok(settings)
}
