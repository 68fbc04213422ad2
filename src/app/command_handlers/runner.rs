use crate::app::command_support::{depth_lines, take_flag, Workspace};
use crate::config::RUNNER_VERSION;
use crate::execution::CommandRegistry;
use crate::queue::queue_depths;
use crate::runtime::{recover_stale_working, JobOutcome, RecoveredJob, RunnerStats};
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::time::now_rfc3339;
use std::time::Duration;

pub fn cmd_status(ws: &Workspace) -> Result<String, String> {
    let settings = ws.settings()?;
    let depths = queue_depths(&ws.paths).map_err(|e| e.to_string())?;
    let registry = CommandRegistry::with_builtins().map_err(|e| e.to_string())?;

    let mut lines = vec![
        format!("runner_version={RUNNER_VERSION}"),
        format!("enable_runner={}", settings.enable_runner),
        format!("verbose_logging={}", settings.verbose_logging),
        format!("default_write_root={}", settings.default_write_root),
        format!("allowed_write_roots={}", settings.allowed_write_roots.join(",")),
        format!("recovery_policy={}", settings.recovery_policy.as_str()),
        format!("jobs_root={}", ws.paths.root.display()),
    ];
    lines.extend(depth_lines(&depths));
    lines.push(format!("commands={}", registry.len()));
    lines.push(format!(
        "stop_requested={}",
        ws.paths.stop_signal_path().exists()
    ));
    Ok(lines.join("\n"))
}

pub fn cmd_commands() -> Result<String, String> {
    let registry = CommandRegistry::with_builtins().map_err(|e| e.to_string())?;
    let mut lines = vec![format!("count={}", registry.len())];
    lines.extend(registry.names().into_iter().map(|name| format!("command={name}")));
    Ok(lines.join("\n"))
}

pub fn cmd_process_next(ws: &Workspace) -> Result<String, String> {
    let settings = ws.settings()?;
    let mut runner = ws.runner(settings)?;
    let recovered = runner
        .initialize_without_polling()
        .map_err(|e| e.to_string())?;

    let mut lines = recovered_lines(&recovered);
    match runner.process_next_job().map_err(|e| e.to_string())? {
        None => {
            lines.push("processed=false".to_string());
            lines.push("reason=inbox_empty".to_string());
        }
        Some(JobOutcome::Waiting {
            job_id,
            required_version,
            ..
        }) => {
            lines.push("processed=false".to_string());
            lines.push(format!("job_id={job_id}"));
            lines.push("status=WAITING".to_string());
            lines.push(format!("required_runner_version={required_version}"));
        }
        Some(JobOutcome::AlreadyDone {
            job_id,
            result_path,
        }) => {
            lines.push("processed=false".to_string());
            lines.push(format!("job_id={job_id}"));
            lines.push("status=ALREADY_DONE".to_string());
            lines.push(format!("result={}", result_path.display()));
        }
        Some(JobOutcome::Dead(finished)) => {
            let reason = finished
                .result
                .error
                .as_ref()
                .map(|error| format!("{}: {}", error.kind, error.message))
                .unwrap_or_else(|| "failed".to_string());
            return Err(format!(
                "job `{}` dead-lettered: {reason}\nresult={}",
                finished.job_id,
                finished.result_path.display()
            ));
        }
        Some(JobOutcome::Done(finished)) => {
            lines.push("processed=true".to_string());
            lines.push(format!("job_id={}", finished.job_id));
            lines.push(format!("status={}", finished.result.status.as_str()));
            lines.push(format!("commands={}", finished.result.commands.len()));
            lines.push(format!("elapsed_ms={}", finished.result.elapsed_ms));
            lines.push(format!("final_path={}", finished.final_path.display()));
            lines.push(format!("result={}", finished.result_path.display()));
        }
    }
    Ok(lines.join("\n"))
}

pub fn cmd_run(ws: &Workspace, args: &[String]) -> Result<String, String> {
    let (once, rest) = take_flag(args, "--once");
    if let Some(extra) = rest.first() {
        return Err(format!("unexpected argument `{extra}` for run"));
    }
    let settings = ws.settings()?;

    if once {
        let mut runner = ws.runner(settings)?;
        let recovered = runner
            .initialize_without_polling()
            .map_err(|e| e.to_string())?;
        let outcomes = runner.drain().map_err(|e| e.to_string())?;
        let mut lines = recovered_lines(&recovered);
        lines.extend(stats_lines(&runner.status().map_err(|e| e.to_string())?.stats));
        lines.extend(
            outcomes
                .iter()
                .map(|outcome| format!("job={}:{}", outcome.job_id(), outcome_label(outcome))),
        );
        return Ok(lines.join("\n"));
    }

    if !settings.enable_runner {
        return Err(
            "runner is disabled in settings; run `autogen-jobs toggle-runner` or use `run --once`"
                .to_string(),
        );
    }
    let mut runner = ws.runner(settings)?;
    let recovered = runner.initialize().map_err(|e| e.to_string())?;
    runner.wait_for_stop();

    let mut lines = vec!["stopped=true".to_string()];
    lines.extend(recovered_lines(&recovered));
    lines.extend(stats_lines(&runner.status().map_err(|e| e.to_string())?.stats));
    Ok(lines.join("\n"))
}

pub fn cmd_stop(ws: &Workspace) -> Result<String, String> {
    ws.ensure_dirs()?;
    let path = ws.paths.stop_signal_path();
    atomic_write_file(&path, now_rfc3339().as_bytes())
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    Ok(format!("stop_requested=true\nsignal={}", path.display()))
}

pub fn cmd_recover(ws: &Workspace) -> Result<String, String> {
    let settings = ws.settings()?;
    ws.ensure_dirs()?;
    let recovered = recover_stale_working(
        &ws.paths,
        settings.recovery_policy,
        Duration::from_secs(settings.stale_working_secs),
    )
    .map_err(|e| e.to_string())?;
    let mut lines = vec![format!("policy={}", settings.recovery_policy.as_str())];
    lines.extend(recovered_lines(&recovered));
    if recovered.is_empty() {
        lines.push("recovered=0".to_string());
    }
    Ok(lines.join("\n"))
}

fn recovered_lines(recovered: &[RecoveredJob]) -> Vec<String> {
    if recovered.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("recovered={}", recovered.len())];
    lines.extend(recovered.iter().map(|job| {
        let action = if job.dead_lettered { "dead" } else { "requeued" };
        format!("recovered_job={}:{action}", job.job_id)
    }));
    lines
}

fn stats_lines(stats: &RunnerStats) -> Vec<String> {
    vec![
        format!("processed={}", stats.processed),
        format!("done={}", stats.done),
        format!("dead={}", stats.dead),
        format!("waiting={}", stats.waiting),
        format!("skipped={}", stats.skipped),
    ]
}

fn outcome_label(outcome: &JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Done(_) => "DONE",
        JobOutcome::Dead(_) => "DEAD",
        JobOutcome::Waiting { .. } => "WAITING",
        JobOutcome::AlreadyDone { .. } => "ALREADY_DONE",
    }
}
