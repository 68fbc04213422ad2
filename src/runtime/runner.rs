use super::poller::{sleep_with_stop, Backoff};
use super::recovery::{recover_stale_working, RecoveredJob};
use super::append_runner_log;
use crate::commands::register_builtins;
use crate::config::{ConfigError, Settings, RUNNER_VERSION};
use crate::execution::{
    CommandContext, CommandExecResult, CommandRegistry, ErrorKind, JobCommand, JobLog,
    RegistryError,
};
use crate::path_guard::PathGuard;
use crate::queue::{
    bootstrap_job_dirs, claim_next, complete_dead, complete_done, discard, queue_depths,
    read_result, requeue, ClaimedJob, CommandInvocation, CommandRecord, Job, JobError, JobPaths,
    JobResult, JobStatus, OnError, QueueDepths, QueueError,
};
use crate::shared::time::now_rfc3339;
use crate::world::{Host, WorldError};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("runner must be initialized before processing jobs")]
    NotInitialized,
    #[error("failed to spawn runner poller thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJob {
    pub job_id: String,
    pub final_path: PathBuf,
    pub result_path: PathBuf,
    pub result: JobResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Done(FinishedJob),
    Dead(FinishedJob),
    Waiting {
        job_id: String,
        required_version: u32,
        inbox_path: PathBuf,
    },
    AlreadyDone {
        job_id: String,
        result_path: PathBuf,
    },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Done(finished) | Self::Dead(finished) => &finished.job_id,
            Self::Waiting { job_id, .. } | Self::AlreadyDone { job_id, .. } => job_id,
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead(_))
    }

    pub fn finished(&self) -> Option<&FinishedJob> {
        match self {
            Self::Done(finished) | Self::Dead(finished) => Some(finished),
            Self::Waiting { .. } | Self::AlreadyDone { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        self.finished().and_then(|finished| finished.result.error.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerStats {
    pub processed: u64,
    pub done: u64,
    pub dead: u64,
    pub waiting: u64,
    pub skipped: u64,
    pub last_job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerStatus {
    pub runner_version: u32,
    pub enabled: bool,
    pub initialized: bool,
    pub polling: bool,
    pub verbose_logging: bool,
    pub registered_commands: usize,
    pub depths: QueueDepths,
    pub stats: RunnerStats,
}

#[derive(Clone)]
struct JobProcessor {
    paths: JobPaths,
    settings: Settings,
    guard: PathGuard,
    registry: Arc<CommandRegistry>,
    host: Arc<Mutex<Host>>,
    stats: Arc<Mutex<RunnerStats>>,
}

struct Poller {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct JobRunner {
    processor: JobProcessor,
    initialized: bool,
    poller: Option<Poller>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobRunner {
    pub fn new(paths: JobPaths, settings: Settings, host: Host) -> Self {
        let project_root = paths
            .root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.root.clone());
        let guard = PathGuard::new(project_root, &settings.allowed_write_roots);
        Self {
            processor: JobProcessor {
                paths,
                settings,
                guard,
                registry: Arc::new(CommandRegistry::new()),
                host: Arc::new(Mutex::new(host)),
                stats: Arc::new(Mutex::new(RunnerStats::default())),
            },
            initialized: false,
            poller: None,
        }
    }

    pub fn with_guard(mut self, guard: PathGuard) -> Self {
        self.processor.guard = guard;
        self
    }

    pub fn paths(&self) -> &JobPaths {
        &self.processor.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.processor.settings
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.processor.registry
    }

    pub fn host(&self) -> Arc<Mutex<Host>> {
        Arc::clone(&self.processor.host)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|poller| !poller.handle.is_finished())
    }

    pub fn register_command(&mut self, command: Arc<dyn JobCommand>) -> Result<(), RegistryError> {
        if self.initialized {
            return Err(RegistryError::Frozen(command.name().to_string()));
        }
        Arc::make_mut(&mut self.processor.registry).register(command)
    }

    pub fn initialize(&mut self) -> Result<Vec<RecoveredJob>, RunnerError> {
        let recovered = self.prepare()?;
        if self.processor.settings.enable_runner {
            self.arm_poller()?;
        }
        Ok(recovered)
    }

    pub fn initialize_without_polling(&mut self) -> Result<Vec<RecoveredJob>, RunnerError> {
        self.prepare()
    }

    fn prepare(&mut self) -> Result<Vec<RecoveredJob>, RunnerError> {
        if self.initialized {
            return Ok(Vec::new());
        }
        self.processor.settings.validate()?;
        register_builtins(Arc::make_mut(&mut self.processor.registry))?;

        let paths = &self.processor.paths;
        bootstrap_job_dirs(paths)?;
        let recovered = recover_stale_working(
            paths,
            self.processor.settings.recovery_policy,
            Duration::from_secs(self.processor.settings.stale_working_secs),
        )?;
        append_runner_log(
            paths,
            "info",
            "runner.initialized",
            &format!(
                "version={} commands={} recovered={}",
                RUNNER_VERSION,
                self.processor.registry.len(),
                recovered.len()
            ),
        );
        self.initialized = true;
        Ok(recovered)
    }

    fn arm_poller(&mut self) -> Result<(), RunnerError> {
        if self.is_polling() {
            return Ok(());
        }
        let stop_path = self.processor.paths.stop_signal_path();
        if stop_path.exists() {
            let _ = fs::remove_file(&stop_path);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let processor = self.processor.clone();
        let handle = thread::Builder::new()
            .name("autogen-jobs-poller".to_string())
            .spawn(move || processor.poll_loop(&stop_flag))
            .map_err(|source| RunnerError::Spawn { source })?;
        self.poller = Some(Poller { stop, handle });
        append_runner_log(&self.processor.paths, "info", "runner.polling", "armed");
        Ok(())
    }

    pub fn process_next_job(&self) -> Result<Option<JobOutcome>, RunnerError> {
        if !self.initialized {
            return Err(RunnerError::NotInitialized);
        }
        self.processor.process_next()
    }

    pub fn drain(&self) -> Result<Vec<JobOutcome>, RunnerError> {
        let mut outcomes = Vec::new();
        let mut waiting = BTreeSet::new();
        while let Some(outcome) = self.process_next_job()? {
            if let JobOutcome::Waiting { job_id, .. } = &outcome {
                if !waiting.insert(job_id.clone()) {
                    break;
                }
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub fn wait_for_stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            let _ = poller.handle.join();
            append_runner_log(&self.processor.paths, "info", "runner.stopped", "poller exited");
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop.store(true, Ordering::Relaxed);
            let _ = poller.handle.join();
            append_runner_log(&self.processor.paths, "info", "runner.shutdown", "polling disarmed");
        }
    }

    pub fn status(&self) -> Result<RunnerStatus, RunnerError> {
        let settings = &self.processor.settings;
        Ok(RunnerStatus {
            runner_version: RUNNER_VERSION,
            enabled: settings.enable_runner,
            initialized: self.initialized,
            polling: self.is_polling(),
            verbose_logging: settings.verbose_logging,
            registered_commands: self.processor.registry.len(),
            depths: queue_depths(&self.processor.paths)?,
            stats: lock(&self.processor.stats).clone(),
        })
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl JobProcessor {
    fn poll_loop(&self, stop: &AtomicBool) {
        let mut backoff = Backoff::new(
            self.settings.poll_interval_ms,
            self.settings.max_poll_interval_ms,
        );
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let stop_path = self.paths.stop_signal_path();
            if stop_path.exists() {
                let _ = fs::remove_file(&stop_path);
                append_runner_log(&self.paths, "info", "runner.stop.signal", "stop file detected");
                break;
            }

            let busy = match self.process_next() {
                Ok(Some(JobOutcome::Waiting { .. })) | Ok(None) => false,
                Ok(Some(_)) => true,
                Err(err) => {
                    append_runner_log(&self.paths, "error", "runner.cycle.failed", &err.to_string());
                    false
                }
            };
            if busy {
                backoff.reset();
            } else if !sleep_with_stop(stop, backoff.idle()) {
                break;
            }
        }
    }

    fn process_next(&self) -> Result<Option<JobOutcome>, RunnerError> {
        let mut host = lock(&self.host);
        let Some(claimed) = claim_next(&self.paths)? else {
            return Ok(None);
        };
        append_runner_log(&self.paths, "info", "job.claimed", &claimed.file_name);
        let outcome = self.process_claimed(&mut host, claimed)?;

        let mut stats = lock(&self.stats);
        match &outcome {
            JobOutcome::Done(_) => stats.done += 1,
            JobOutcome::Dead(_) => stats.dead += 1,
            JobOutcome::Waiting { .. } => stats.waiting += 1,
            JobOutcome::AlreadyDone { .. } => stats.skipped += 1,
        }
        if matches!(outcome, JobOutcome::Done(_) | JobOutcome::Dead(_)) {
            stats.processed += 1;
        }
        stats.last_job_id = Some(outcome.job_id().to_string());
        Ok(Some(outcome))
    }

    fn process_claimed(&self, host: &mut Host, claimed: ClaimedJob) -> Result<JobOutcome, RunnerError> {
        let clock = Instant::now();
        let started_at = now_rfc3339();
        let stem = claimed.file_stem().to_string();

        let parsed = claimed
            .read_payload()
            .map_err(|err| err.to_string())
            .and_then(|raw| Job::parse(&raw, &stem).map_err(|err| err.to_string()));
        let job = match parsed {
            Ok(job) => job,
            Err(message) => {
                let mut result = JobResult::new(&stem, &claimed.file_name, false, started_at);
                result.fail(ErrorKind::Parse, format!("Failed to parse job: {message}"), None);
                return self.finish(&claimed, result, clock);
            }
        };

        let completed = read_result(&self.paths, &job.job_id).ok().flatten();
        if completed.is_some_and(|stored| stored.status == JobStatus::Done) {
            discard(&claimed)?;
            append_runner_log(
                &self.paths,
                "info",
                "job.skipped",
                &format!("{} already completed; discarded {}", job.job_id, claimed.file_name),
            );
            return Ok(JobOutcome::AlreadyDone {
                result_path: self.paths.result_path(&job.job_id),
                job_id: job.job_id,
            });
        }

        if job.runner_min_version > RUNNER_VERSION {
            let inbox_path = requeue(&self.paths, &claimed)?;
            append_runner_log(
                &self.paths,
                "warn",
                "job.waiting",
                &format!(
                    "{} requires runner version {} (have {})",
                    job.job_id, job.runner_min_version, RUNNER_VERSION
                ),
            );
            return Ok(JobOutcome::Waiting {
                job_id: job.job_id,
                required_version: job.runner_min_version,
                inbox_path,
            });
        }

        let mut result = JobResult::new(&job.job_id, &claimed.file_name, job.dry_run, started_at);
        let mut log = JobLog::new(&job.job_id, self.settings.verbose_logging)
            .with_file(&self.paths.job_log_path(&job.job_id));
        let write_root = job.write_root(&self.settings.default_write_root);

        let preflight = self.guard.check_write_root(write_root);
        if !preflight.allowed {
            log.error(format!("Pre-flight failed: {}", preflight.reason));
            result.fail(ErrorKind::Preflight, preflight.reason, None);
            result.set_logs(log.entries());
            return self.finish(&claimed, result, clock);
        }

        log.info(format!(
            "Processing job {} ({} commands, writeRoot={write_root}{})",
            job.job_id,
            job.commands.len(),
            if job.dry_run { ", dry run" } else { "" }
        ));
        {
            let mut ctx = CommandContext::new(&job, host, &self.guard, &mut log, write_root)
                .with_registry(&self.registry);
            for (index, invocation) in job.commands.iter().enumerate() {
                ctx.begin_command(index, &invocation.cmd);
                let outcome = self.invoke(&mut ctx, invocation);
                let record = record_outcome(&mut ctx, index, invocation, &outcome);
                ctx.end_command(invocation.out.values().cloned());
                result.commands.push(record);

                if !outcome.success {
                    let kind = outcome.error_kind.unwrap_or(ErrorKind::CommandFailure);
                    result.fail(kind, outcome.message.clone(), Some(index));
                    if job.on_error == OnError::Stop {
                        ctx.log().error(format!(
                            "Stopping job after command {index} ({}) failed",
                            invocation.cmd
                        ));
                        break;
                    }
                }
            }
        }

        if result.success {
            log.info(format!("Job {} completed successfully", job.job_id));
        } else {
            log.error(format!("Job {} failed", job.job_id));
        }
        result.set_logs(log.entries());
        self.finish(&claimed, result, clock)
    }

    fn invoke(&self, ctx: &mut CommandContext<'_>, invocation: &CommandInvocation) -> CommandExecResult {
        let Some(command) = self.registry.lookup(&invocation.cmd) else {
            let message = format!("Unknown command: {}", invocation.cmd);
            ctx.log().error(message.clone());
            return CommandExecResult::fail(ErrorKind::UnknownCommand, message);
        };

        ctx.log().debug(format!("Executing {}", command.name()));
        match panic::catch_unwind(AssertUnwindSafe(|| command.execute(ctx, &invocation.args))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = format!(
                    "Command {} panicked: {}",
                    invocation.cmd,
                    panic_message(payload.as_ref())
                );
                ctx.log().error(message.clone());
                CommandExecResult::failure(message)
            }
        }
    }

    fn finish(
        &self,
        claimed: &ClaimedJob,
        mut result: JobResult,
        clock: Instant,
    ) -> Result<JobOutcome, RunnerError> {
        result.finished_at_utc = now_rfc3339();
        result.elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        let finalized = if result.success {
            complete_done(&self.paths, claimed, &mut result)?
        } else {
            complete_dead(&self.paths, claimed, &mut result)?
        };

        let summary = match &result.error {
            Some(error) => format!("{} dead: {} {}", result.job_id, error.kind, error.message),
            None => format!(
                "{} done: {} commands in {}ms",
                result.job_id,
                result.commands.len(),
                result.elapsed_ms
            ),
        };
        let (level, event) = if result.success {
            ("info", "job.done")
        } else {
            ("warn", "job.dead")
        };
        append_runner_log(&self.paths, level, event, &summary);

        let finished = FinishedJob {
            job_id: result.job_id.clone(),
            final_path: finalized.final_path,
            result_path: finalized.result_path,
            result,
        };
        Ok(if finished.result.success {
            JobOutcome::Done(finished)
        } else {
            JobOutcome::Dead(finished)
        })
    }
}

fn record_outcome(
    ctx: &mut CommandContext<'_>,
    index: usize,
    invocation: &CommandInvocation,
    outcome: &CommandExecResult,
) -> CommandRecord {
    let mut outputs = BTreeMap::new();
    if outcome.success {
        for (name, object) in &outcome.outputs {
            outputs.insert(name.clone(), ctx.describe(*object));
        }
        for (logical, variable) in &invocation.out {
            match outcome.output(logical) {
                Some(object) => ctx.set_var(variable, object),
                None if ctx.is_dry_run() => {}
                None => ctx.log().warn(format!(
                    "Command {} produced no output '{logical}' for {variable}",
                    invocation.cmd
                )),
            }
        }
        ctx.log()
            .info(format!("{} succeeded: {}", invocation.cmd, outcome.message));
    } else {
        let kind = outcome.error_kind.unwrap_or(ErrorKind::CommandFailure);
        ctx.log()
            .error(format!("{} failed ({kind}): {}", invocation.cmd, outcome.message));
    }

    CommandRecord {
        index,
        cmd: invocation.cmd.clone(),
        success: outcome.success,
        message: outcome.message.clone(),
        error_kind: outcome.error_kind,
        outputs,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}
