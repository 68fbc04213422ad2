use super::{is_job_filename, job_file_stem, JobPaths, JobResult, QueueError};
use crate::shared::fs_atomic::{atomic_write_file, move_replacing};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub file_name: String,
    pub inbox_path: PathBuf,
    pub working_path: PathBuf,
}

impl ClaimedJob {
    pub fn file_stem(&self) -> &str {
        job_file_stem(&self.file_name)
    }

    pub fn read_payload(&self) -> Result<String, QueueError> {
        fs::read_to_string(&self.working_path).map_err(|e| io_err(&self.working_path, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedJob {
    pub final_path: PathBuf,
    pub result_path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepths {
    pub inbox: usize,
    pub working: usize,
    pub done: usize,
    pub dead: usize,
    pub results: usize,
}

pub fn bootstrap_job_dirs(paths: &JobPaths) -> Result<(), QueueError> {
    for dir in paths.required_directories() {
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    }
    Ok(())
}

pub fn claim_next(paths: &JobPaths) -> Result<Option<ClaimedJob>, QueueError> {
    fs::create_dir_all(&paths.working).map_err(|e| io_err(&paths.working, e))?;
    for inbox_path in sorted_job_paths(&paths.inbox)? {
        let Some(file_name) = inbox_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let working_path = paths.working.join(file_name);
        if working_path.exists() {
            continue;
        }

        match fs::rename(&inbox_path, &working_path) {
            Ok(()) => {
                // working/ age is measured from the claim, not from submission
                let _ = touch(&working_path);
                return Ok(Some(ClaimedJob {
                    file_name: file_name.to_string(),
                    inbox_path,
                    working_path,
                }))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(io_err(&inbox_path, err)),
        }
    }
    Ok(None)
}

pub fn complete_done(
    paths: &JobPaths,
    claimed: &ClaimedJob,
    result: &mut JobResult,
) -> Result<FinalizedJob, QueueError> {
    finalize(paths, claimed, &paths.done, result)
}

pub fn complete_dead(
    paths: &JobPaths,
    claimed: &ClaimedJob,
    result: &mut JobResult,
) -> Result<FinalizedJob, QueueError> {
    finalize(paths, claimed, &paths.dead, result)
}

pub fn discard(claimed: &ClaimedJob) -> Result<(), QueueError> {
    fs::remove_file(&claimed.working_path).map_err(|e| io_err(&claimed.working_path, e))
}

pub fn requeue(paths: &JobPaths, claimed: &ClaimedJob) -> Result<PathBuf, QueueError> {
    requeue_as(paths, claimed, &claimed.file_name)
}

pub(crate) fn requeue_as(
    paths: &JobPaths,
    claimed: &ClaimedJob,
    file_name: &str,
) -> Result<PathBuf, QueueError> {
    let target = paths.inbox.join(file_name);
    fs::rename(&claimed.working_path, &target).map_err(|e| io_err(&claimed.working_path, e))?;
    // rename keeps the old mtime; move the job behind everything already waiting
    touch(&target).map_err(|e| io_err(&target, e))?;
    Ok(target)
}

fn touch(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .append(true)
        .open(path)
        .and_then(|file| file.set_modified(SystemTime::now()))
}

pub fn write_result(paths: &JobPaths, result: &JobResult) -> Result<PathBuf, QueueError> {
    let path = paths.result_path(&result.job_id);
    let body = serde_json::to_vec_pretty(result).map_err(|e| parse_err(&path, e))?;
    atomic_write_file(&path, &body).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

pub fn read_result(paths: &JobPaths, job_id: &str) -> Result<Option<JobResult>, QueueError> {
    let path = paths.result_path(job_id);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(&path, err)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| parse_err(&path, e))
}

pub fn queue_depths(paths: &JobPaths) -> Result<QueueDepths, QueueError> {
    Ok(QueueDepths {
        inbox: count_job_files(&paths.inbox)?,
        working: count_job_files(&paths.working)?,
        done: count_job_files(&paths.done)?,
        dead: count_job_files(&paths.dead)?,
        results: count_files(&paths.results, |name| name.ends_with(super::RESULT_FILE_SUFFIX))?,
    })
}

pub(crate) fn sorted_job_paths(dir: &Path) -> Result<Vec<PathBuf>, QueueError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(dir, err)),
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_job_filename(name) {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| io_err(&path, e))?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((modified, path));
    }

    entries.sort_by(|(a_time, a_path), (b_time, b_path)| {
        a_time
            .cmp(b_time)
            .then_with(|| a_path.file_name().cmp(&b_path.file_name()))
    });

    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

fn finalize(
    paths: &JobPaths,
    claimed: &ClaimedJob,
    terminal_dir: &Path,
    result: &mut JobResult,
) -> Result<FinalizedJob, QueueError> {
    let target = terminal_dir.join(&claimed.file_name);
    let final_path =
        move_replacing(&claimed.working_path, &target).map_err(|e| io_err(&claimed.working_path, e))?;
    result.final_path = final_path.display().to_string();
    let result_path = write_result(paths, result)?;
    Ok(FinalizedJob {
        final_path,
        result_path,
    })
}

fn count_job_files(dir: &Path) -> Result<usize, QueueError> {
    count_files(dir, is_job_filename)
}

fn count_files(dir: &Path, accept: impl Fn(&str) -> bool) -> Result<usize, QueueError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(io_err(dir, err)),
    };
    let mut count = 0;
    for entry in read {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if entry.path().is_file() && entry.file_name().to_str().is_some_and(&accept) {
            count += 1;
        }
    }
    Ok(count)
}

pub(crate) fn io_err(path: &Path, source: std::io::Error) -> QueueError {
    QueueError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn parse_err(path: &Path, source: serde_json::Error) -> QueueError {
    QueueError::Parse {
        path: path.display().to_string(),
        source,
    }
}
