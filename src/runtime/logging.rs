use crate::queue::JobPaths;
use crate::shared::time::now_rfc3339;
use std::fs;
use std::io::Write;

pub fn append_runner_log(paths: &JobPaths, level: &str, event: &str, message: &str) {
    let payload = serde_json::json!({
        "timestamp": now_rfc3339(),
        "level": level,
        "event": event,
        "message": message,
    });

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    let path = paths.runner_log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    #[test]
    fn appends_one_json_object_per_line() {
        let dir = tempdir().expect("tempdir");
        let paths = JobPaths::from_project_root(dir.path());
        append_runner_log(&paths, "info", "runner.started", "version=2");
        append_runner_log(&paths, "warn", "job.waiting", "t1");

        let raw = fs::read_to_string(paths.runner_log_path()).expect("log");
        let lines: Vec<Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "runner.started");
        assert_eq!(lines[1]["level"], "warn");
        assert!(lines[1]["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
    }
}
