use crate::app::command_support::{take_option, Workspace};
use crate::queue::{job_filename, read_result, Job, JobResult, PENDING_SUFFIX};
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::{validate_job_id, JobId};
use crate::shared::time::now_rfc3339;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

pub fn cmd_submit(ws: &Workspace, args: &[String]) -> Result<String, String> {
    let [file] = args else {
        return Err("usage: autogen-jobs submit <file>".to_string());
    };
    let settings = ws.settings()?;
    ws.ensure_dirs()?;

    let raw = fs::read_to_string(file).map_err(|e| format!("failed to read {file}: {e}"))?;
    let mut body: Map<String, Value> = match serde_json::from_str(&raw) {
        Ok(Value::Object(body)) => body,
        Ok(_) => return Err(format!("job file {file} must contain a JSON object")),
        Err(e) => return Err(format!("invalid job json in {file}: {e}")),
    };
    let job_id = prepare_submission(&mut body, &settings.default_write_root)?;

    let encoded = serde_json::to_string_pretty(&Value::Object(body))
        .map_err(|e| format!("failed to encode job: {e}"))?;
    Job::parse(&encoded, &job_id).map_err(|e| format!("job `{job_id}` is invalid: {e}"))?;

    let target = ws.paths.inbox.join(job_filename(&job_id));
    if target.exists() {
        return Err(format!("job `{job_id}` is already queued at {}", target.display()));
    }
    let pending = ws
        .paths
        .inbox
        .join(format!("{}{PENDING_SUFFIX}", job_filename(&job_id)));
    atomic_write_file(&pending, encoded.as_bytes())
        .map_err(|e| format!("failed to write {}: {e}", pending.display()))?;
    fs::rename(&pending, &target)
        .map_err(|e| format!("failed to publish {}: {e}", target.display()))?;

    Ok(format!(
        "submitted=true\njob_id={job_id}\npath={}",
        target.display()
    ))
}

fn prepare_submission(body: &mut Map<String, Value>, default_write_root: &str) -> Result<String, String> {
    let job_id = match body.get("jobId").and_then(Value::as_str).map(str::trim) {
        Some(id) if !id.is_empty() => {
            validate_job_id(id).map_err(|e| format!("invalid jobId `{id}`: {e}"))?;
            id.to_string()
        }
        _ => JobId::generate("job").as_str().to_string(),
    };
    body.insert("jobId".to_string(), Value::String(job_id.clone()));
    body.entry("schemaVersion").or_insert(Value::from(1));
    if !body.contains_key("projectWriteRoot") && !body.contains_key("writeRoot") {
        body.insert(
            "projectWriteRoot".to_string(),
            Value::String(default_write_root.to_string()),
        );
    }
    body.entry("createdAtUtc")
        .or_insert_with(|| Value::String(now_rfc3339()));
    Ok(job_id)
}

pub fn cmd_check(ws: &Workspace, args: &[String]) -> Result<String, String> {
    let (wait, rest) = take_option(args, "--wait")?;
    let [job_id] = rest.as_slice() else {
        return Err("usage: autogen-jobs check <jobId> [--wait SECS]".to_string());
    };
    let wait = match wait {
        Some(raw) => Duration::from_secs(
            raw.parse::<u64>()
                .map_err(|_| format!("--wait expects whole seconds, got `{raw}`"))?,
        ),
        None => Duration::ZERO,
    };

    let deadline = Instant::now() + wait;
    let result = loop {
        if let Some(result) = read_result(&ws.paths, job_id).map_err(|e| e.to_string())? {
            break result;
        }
        if Instant::now() >= deadline {
            return Err(format!("no result for job `{job_id}` in {}", ws.paths.results.display()));
        }
        thread::sleep(Duration::from_millis(200));
    };
    Ok(render_result(&result, &ws.paths.result_path(job_id)))
}

fn render_result(result: &JobResult, path: &Path) -> String {
    let mut lines = vec![
        format!("job_id={}", result.job_id),
        format!("status={}", result.status.as_str()),
        format!("success={}", result.success),
        format!("dry_run={}", result.dry_run),
        format!("elapsed_ms={}", result.elapsed_ms),
        format!("final_path={}", result.final_path),
        format!("result={}", path.display()),
    ];
    if let Some(error) = &result.error {
        lines.push(format!("error_kind={}", error.kind));
        lines.push(format!("error={}", error.message));
        if let Some(index) = error.command_index {
            lines.push(format!("error_command_index={index}"));
        }
    }
    lines.push(format!("commands={}", result.commands.len()));
    for record in &result.commands {
        let state = match record.error_kind {
            None => "ok".to_string(),
            Some(kind) => kind.to_string(),
        };
        lines.push(format!(
            "command.{}={}:{state}:{}",
            record.index, record.cmd, record.message
        ));
    }
    lines.join("\n")
}
