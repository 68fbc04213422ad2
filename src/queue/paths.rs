use crate::config::jobs_root;
use std::path::{Path, PathBuf};

pub const JOB_FILE_SUFFIX: &str = ".job.json";
pub const PENDING_SUFFIX: &str = ".pending";
pub const RESULT_FILE_SUFFIX: &str = ".result.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub root: PathBuf,
    pub inbox: PathBuf,
    pub working: PathBuf,
    pub done: PathBuf,
    pub dead: PathBuf,
    pub results: PathBuf,
    pub examples: PathBuf,
    pub logs: PathBuf,
}

impl JobPaths {
    pub fn from_project_root(project_root: &Path) -> Self {
        Self::from_jobs_root(&jobs_root(project_root))
    }

    pub fn from_jobs_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            inbox: root.join("inbox"),
            working: root.join("working"),
            done: root.join("done"),
            dead: root.join("dead"),
            results: root.join("results"),
            examples: root.join("examples"),
            logs: root.join("logs"),
        }
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        vec![
            self.inbox.clone(),
            self.working.clone(),
            self.done.clone(),
            self.dead.clone(),
            self.results.clone(),
            self.examples.clone(),
            self.logs.clone(),
        ]
    }

    pub fn result_path(&self, job_id: &str) -> PathBuf {
        self.results.join(result_filename(job_id))
    }

    pub fn runner_log_path(&self) -> PathBuf {
        self.logs.join("runner.log")
    }

    pub fn job_log_path(&self, job_id: &str) -> PathBuf {
        self.logs
            .join("jobs")
            .join(format!("{}.log", sanitize_filename_component(job_id)))
    }

    pub fn stop_signal_path(&self) -> PathBuf {
        self.root.join("runner.stop")
    }
}

pub fn is_job_filename(filename: &str) -> bool {
    filename
        .strip_suffix(JOB_FILE_SUFFIX)
        .is_some_and(|stem| !stem.trim().is_empty())
}

pub fn job_file_stem(filename: &str) -> &str {
    filename.strip_suffix(JOB_FILE_SUFFIX).unwrap_or(filename)
}

pub fn job_filename(job_id: &str) -> String {
    format!("{}{JOB_FILE_SUFFIX}", sanitize_filename_component(job_id))
}

pub fn result_filename(job_id: &str) -> String {
    format!("{}{RESULT_FILE_SUFFIX}", sanitize_filename_component(job_id))
}

fn sanitize_filename_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}
