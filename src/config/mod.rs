pub mod error;
pub mod load;
pub mod paths;
pub mod save;
pub mod settings;
pub use error::ConfigError;
pub use load::load_settings;
pub use paths::{
    jobs_root, resolve_project_root, settings_path, JOBS_DIR_NAME, PROJECT_ROOT_ENV,
    SETTINGS_FILE_NAME,
};
pub use save::save_settings;
pub use settings::{RecoveryPolicy, Settings, DEFAULT_WRITE_ROOT, RUNNER_VERSION};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings = load_settings(dir.path()).expect("load");
        assert_eq!(settings, Settings::default());
        assert!(settings.enable_runner);
        assert_eq!(settings.allowed_write_roots, vec!["Assets/AutoGen"]);
    }

    #[test]
    fn partial_yaml_fills_remaining_fields_with_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = settings_path(dir.path());
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(
            &path,
            r#"
verbose_logging: true
allowed_write_roots:
  - Assets/AutoGen
  - Assets/Generated
recovery_policy: requeue
"#,
        )
        .expect("write");

        let settings = load_settings(dir.path()).expect("load");
        assert!(settings.verbose_logging);
        assert_eq!(settings.allowed_write_roots.len(), 2);
        assert_eq!(settings.recovery_policy, RecoveryPolicy::Requeue);
        assert_eq!(settings.poll_interval_ms, 500);
    }

    #[test]
    fn save_then_load_round_trips_changes() {
        let dir = tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.enable_runner = false;
        settings.stale_working_secs = 120;
        save_settings(dir.path(), &settings).expect("save");

        assert_eq!(load_settings(dir.path()).expect("load"), settings);
    }

    #[test]
    fn validation_rejects_empty_allow_list_and_inverted_poll_bounds() {
        let mut settings = Settings::default();
        settings.allowed_write_roots.clear();
        let err = settings.validate().expect_err("empty roots");
        assert!(err.to_string().contains("allowed_write_roots"));

        let mut settings = Settings::default();
        settings.max_poll_interval_ms = 10;
        let err = settings.validate().expect_err("inverted bounds");
        assert!(err.to_string().contains("max_poll_interval_ms"));
    }
}
