use crate::app::command_support::{take_option, Workspace};
use crate::config::{settings_path, Settings};
use crate::shared::fs_atomic::atomic_write_file;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const SAMPLE_JOB_FILE: &str = "example_hello.job.json";
pub const SKILLS_DIR: &str = ".agent/skills";
pub const DEFAULT_SKILLS_SOURCE: &str = "Packages/com.autogen.jobs/Samples~/Skills";
pub const SKILL_FILES: [&str; 4] = [
    "_index.md",
    "autogen-jobs.md",
    "autogen-templates.md",
    "autogen-executor.md",
];

pub fn cmd_init(ws: &Workspace) -> Result<String, String> {
    ws.ensure_dirs()?;

    let settings_file = settings_path(&ws.project_root);
    let settings = if settings_file.exists() {
        ws.settings()?
    } else {
        let settings = Settings::default();
        ws.save_settings(&settings)?;
        settings
    };

    let write_root = ws.project_root.join(&settings.default_write_root);
    for dir in [
        write_root.join("Prefabs"),
        write_root.join("Configs"),
        ws.project_root.join(SKILLS_DIR),
    ] {
        fs::create_dir_all(&dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
    }

    let sample = ws.paths.examples.join(SAMPLE_JOB_FILE);
    let sample_created = !sample.exists();
    if sample_created {
        let body = serde_json::to_vec_pretty(&sample_job(&settings))
            .map_err(|e| format!("failed to encode sample job: {e}"))?;
        atomic_write_file(&sample, &body)
            .map_err(|e| format!("failed to write {}: {e}", sample.display()))?;
    }

    Ok([
        "initialized=true".to_string(),
        format!("project_root={}", ws.project_root.display()),
        format!("jobs_root={}", ws.paths.root.display()),
        format!("settings={}", settings_file.display()),
        format!("write_root={}", write_root.display()),
        format!("sample_job={}", sample.display()),
        format!("sample_created={sample_created}"),
    ]
    .join("\n"))
}

fn sample_job(settings: &Settings) -> serde_json::Value {
    json!({
        "schemaVersion": 1,
        "jobId": "example_hello",
        "projectWriteRoot": settings.default_write_root,
        "commands": [
            {
                "cmd": "CreateGameObject",
                "args": {"name": "HelloAutoGen", "position": [0, 1, 0], "ensure": true},
                "out": {"go": "$hello"}
            },
            {
                "cmd": "AddComponent",
                "args": {"target": {"ref": "$hello"}, "type": "SpriteRenderer"}
            },
            {"cmd": "SaveAssets"}
        ],
        "meta": {"note": "copy this file into inbox/ to try the runner"}
    })
}

pub fn cmd_install_extensions(ws: &Workspace, args: &[String]) -> Result<String, String> {
    let (source, rest) = take_option(args, "--source")?;
    if let Some(extra) = rest.first() {
        return Err(format!("unexpected argument `{extra}` for install-extensions"));
    }
    let source = source
        .map(PathBuf::from)
        .unwrap_or_else(|| ws.project_root.join(DEFAULT_SKILLS_SOURCE));
    if !source.is_dir() {
        return Err(format!(
            "skills source {} does not exist; pass --source DIR",
            source.display()
        ));
    }

    let target = ws.project_root.join(SKILLS_DIR);
    let copied = copy_skill_files(&source, &target)?;
    Ok([
        format!("copied={copied}"),
        format!("source={}", source.display()),
        format!("target={}", target.display()),
    ]
    .join("\n"))
}

fn copy_skill_files(source: &Path, target: &Path) -> Result<usize, String> {
    fs::create_dir_all(target).map_err(|e| format!("failed to create {}: {e}", target.display()))?;
    let mut copied = 0;
    for name in SKILL_FILES {
        let from = source.join(name);
        if !from.is_file() {
            continue;
        }
        let to = target.join(name);
        fs::copy(&from, &to).map_err(|e| {
            format!("failed to copy {} to {}: {e}", from.display(), to.display())
        })?;
        copied += 1;
    }
    Ok(copied)
}

pub fn cmd_toggle_runner(ws: &Workspace) -> Result<String, String> {
    let mut settings = ws.settings()?;
    settings.enable_runner = !settings.enable_runner;
    let path = ws.save_settings(&settings)?;
    Ok(format!(
        "enable_runner={}\nsettings={}",
        settings.enable_runner,
        path.display()
    ))
}

pub fn cmd_toggle_verbose(ws: &Workspace) -> Result<String, String> {
    let mut settings = ws.settings()?;
    settings.verbose_logging = !settings.verbose_logging;
    let path = ws.save_settings(&settings)?;
    Ok(format!(
        "verbose_logging={}\nsettings={}",
        settings.verbose_logging,
        path.display()
    ))
}

pub fn cmd_reset_settings(ws: &Workspace) -> Result<String, String> {
    let path = ws.save_settings(&Settings::default())?;
    Ok(format!("settings_reset=true\nsettings={}", path.display()))
}
