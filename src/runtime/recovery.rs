use super::append_runner_log;
use crate::config::RecoveryPolicy;
use crate::execution::ErrorKind;
use crate::queue::lifecycle::{requeue_as, sorted_job_paths};
use crate::queue::{
    complete_dead, job_file_stem, ClaimedJob, Job, JobPaths, JobResult, QueueError, JOB_FILE_SUFFIX,
};
use crate::shared::time::now_rfc3339;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

pub const ORPHANED_MESSAGE: &str = "job was orphaned in working/ by an interrupted runner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredJob {
    pub job_id: String,
    pub file_name: String,
    pub target: PathBuf,
    pub dead_lettered: bool,
}

pub fn recover_stale_working(
    paths: &JobPaths,
    policy: RecoveryPolicy,
    min_age: Duration,
) -> Result<Vec<RecoveredJob>, QueueError> {
    let now = SystemTime::now();
    let mut recovered = Vec::new();

    for working_path in sorted_job_paths(&paths.working)? {
        let Some(file_name) = working_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            continue;
        };
        let age = fs::metadata(&working_path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < min_age {
            continue;
        }

        let claimed = ClaimedJob {
            file_name: file_name.clone(),
            inbox_path: paths.inbox.join(&file_name),
            working_path,
        };
        let stem = claimed.file_stem().to_string();
        let job_id = claimed
            .read_payload()
            .ok()
            .and_then(|raw| Job::parse(&raw, &stem).ok())
            .map(|job| job.job_id)
            .unwrap_or(stem);

        let entry = match policy {
            RecoveryPolicy::DeadLetter => {
                let mut result = JobResult::new(&job_id, &file_name, false, now_rfc3339());
                result.fail(ErrorKind::Preflight, ORPHANED_MESSAGE, None);
                let finalized = complete_dead(paths, &claimed, &mut result)?;
                RecoveredJob {
                    job_id,
                    file_name,
                    target: finalized.final_path,
                    dead_lettered: true,
                }
            }
            RecoveryPolicy::Requeue => {
                let name = if claimed.inbox_path.exists() {
                    recovered_job_filename(&file_name)
                } else {
                    file_name.clone()
                };
                let target = requeue_as(paths, &claimed, &name)?;
                RecoveredJob {
                    job_id,
                    file_name,
                    target,
                    dead_lettered: false,
                }
            }
        };

        append_runner_log(
            paths,
            "warn",
            "queue.recovered",
            &format!(
                "{} {} -> {}",
                policy.as_str(),
                entry.file_name,
                entry.target.display()
            ),
        );
        recovered.push(entry);
    }

    Ok(recovered)
}

pub(crate) fn recovered_job_filename(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(now_rfc3339().as_bytes());
    let digest = hasher.finalize();
    let hash = digest[..4]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    format!("recovered-{hash}-{}{JOB_FILE_SUFFIX}", job_file_stem(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{bootstrap_job_dirs, is_job_filename, read_result};
    use tempfile::tempdir;

    #[test]
    fn recovered_names_stay_job_files() {
        let name = recovered_job_filename("t1.job.json");
        assert!(name.starts_with("recovered-"));
        assert!(is_job_filename(&name));
    }

    #[test]
    fn young_entries_are_left_alone() {
        let dir = tempdir().expect("tempdir");
        let paths = JobPaths::from_project_root(dir.path());
        bootstrap_job_dirs(&paths).expect("bootstrap");
        fs::write(paths.working.join("t1.job.json"), "{}").expect("write");

        let recovered =
            recover_stale_working(&paths, RecoveryPolicy::DeadLetter, Duration::from_secs(3600))
                .expect("recover");
        assert!(recovered.is_empty());
        assert!(paths.working.join("t1.job.json").exists());
        assert!(read_result(&paths, "t1").expect("read").is_none());
    }
}
