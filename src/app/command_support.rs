use crate::config::{load_settings, resolve_project_root, save_settings, Settings};
use crate::queue::{bootstrap_job_dirs, JobPaths, QueueDepths};
use crate::runtime::JobRunner;
use crate::world::Host;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub project_root: PathBuf,
    pub paths: JobPaths,
}

impl Workspace {
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, String> {
        let project_root = resolve_project_root(explicit).map_err(|e| e.to_string())?;
        Ok(Self {
            paths: JobPaths::from_project_root(&project_root),
            project_root,
        })
    }

    pub fn ensure_dirs(&self) -> Result<(), String> {
        bootstrap_job_dirs(&self.paths).map_err(|e| e.to_string())
    }

    pub fn settings(&self) -> Result<Settings, String> {
        load_settings(&self.project_root).map_err(|e| e.to_string())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<PathBuf, String> {
        save_settings(&self.project_root, settings).map_err(|e| e.to_string())
    }

    pub fn runner(&self, settings: Settings) -> Result<JobRunner, String> {
        let host = Host::open(&self.project_root, &settings.scene_file).map_err(|e| e.to_string())?;
        Ok(JobRunner::new(self.paths.clone(), settings, host))
    }
}

pub fn split_global_args(args: Vec<String>) -> Result<(Option<PathBuf>, Vec<String>), String> {
    let mut project = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--project" {
            let value = iter
                .next()
                .ok_or_else(|| "--project requires a directory".to_string())?;
            project = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--project=") {
            project = Some(PathBuf::from(value));
        } else {
            rest.push(arg);
        }
    }
    Ok((project, rest))
}

pub fn take_flag(args: &[String], flag: &str) -> (bool, Vec<String>) {
    let present = args.iter().any(|arg| arg == flag);
    let rest = args.iter().filter(|arg| *arg != flag).cloned().collect();
    (present, rest)
}

pub fn take_option(args: &[String], option: &str) -> Result<(Option<String>, Vec<String>), String> {
    let mut value = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == option {
            let next = iter
                .next()
                .ok_or_else(|| format!("{option} requires a value"))?;
            value = Some(next.clone());
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((value, rest))
}

pub fn depth_lines(depths: &QueueDepths) -> Vec<String> {
    vec![
        format!("inbox={}", depths.inbox),
        format!("working={}", depths.working),
        format!("done={}", depths.done),
        format!("dead={}", depths.dead),
        format!("results={}", depths.results),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn project_option_is_stripped_anywhere() {
        let (project, rest) =
            split_global_args(strings(&["status", "--project", "/tmp/game"])).expect("split");
        assert_eq!(project, Some(PathBuf::from("/tmp/game")));
        assert_eq!(rest, strings(&["status"]));

        let (project, rest) = split_global_args(strings(&["--project=/p", "run", "--once"])).expect("split");
        assert_eq!(project, Some(PathBuf::from("/p")));
        assert_eq!(rest, strings(&["run", "--once"]));

        assert!(split_global_args(strings(&["--project"])).is_err());
    }

    #[test]
    fn flags_and_options_are_extracted() {
        let (once, rest) = take_flag(&strings(&["--once", "x"]), "--once");
        assert!(once);
        assert_eq!(rest, strings(&["x"]));

        let (wait, rest) = take_option(&strings(&["t1", "--wait", "5"]), "--wait").expect("option");
        assert_eq!(wait.as_deref(), Some("5"));
        assert_eq!(rest, strings(&["t1"]));
        assert!(take_option(&strings(&["--wait"]), "--wait").is_err());
    }
}
