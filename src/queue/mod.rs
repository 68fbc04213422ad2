pub mod job;
pub mod lifecycle;
pub mod paths;
pub mod result;
pub use job::{CommandInvocation, Job, JobParseError, OnError, SUPPORTED_SCHEMA_VERSION};
pub use lifecycle::{
    bootstrap_job_dirs, claim_next, complete_dead, complete_done, discard, queue_depths,
    read_result, requeue, write_result, ClaimedJob, FinalizedJob, QueueDepths,
};
pub use paths::{
    is_job_filename, job_file_stem, job_filename, result_filename, JobPaths, JOB_FILE_SUFFIX,
    PENDING_SUFFIX, RESULT_FILE_SUFFIX,
};
pub use result::{CommandRecord, JobError, JobResult, JobStatus, RESULT_LOG_EXCERPT};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid queue payload in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ErrorKind;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn queue() -> (tempfile::TempDir, JobPaths) {
        let tmp = tempdir().expect("tempdir");
        let paths = JobPaths::from_project_root(tmp.path());
        bootstrap_job_dirs(&paths).expect("bootstrap");
        (tmp, paths)
    }

    #[test]
    fn claims_oldest_job_file_first_and_ignores_pending() {
        let (_tmp, paths) = queue();
        fs::write(paths.inbox.join("b.job.json.pending"), "{}").expect("pending");
        fs::write(paths.inbox.join("a.job.json"), "{}").expect("a");
        std::thread::sleep(Duration::from_millis(20));
        fs::write(paths.inbox.join("b.job.json"), "{}").expect("b");
        fs::write(paths.inbox.join("notes.txt"), "x").expect("notes");

        let first = claim_next(&paths).expect("claim").expect("a");
        assert_eq!(first.file_name, "a.job.json");
        assert!(first.working_path.exists());
        assert!(!first.inbox_path.exists());

        let second = claim_next(&paths).expect("claim").expect("b");
        assert_eq!(second.file_stem(), "b");
        assert!(claim_next(&paths).expect("claim").is_none());
    }

    #[test]
    fn claim_skips_names_already_in_working() {
        let (_tmp, paths) = queue();
        fs::write(paths.working.join("a.job.json"), "{}").expect("working");
        fs::write(paths.inbox.join("a.job.json"), "{}").expect("inbox");

        assert!(claim_next(&paths).expect("claim").is_none());
        assert!(paths.inbox.join("a.job.json").exists());
    }

    #[test]
    fn complete_moves_then_writes_result_and_requeue_returns_to_inbox() {
        let (_tmp, paths) = queue();
        fs::write(paths.inbox.join("a.job.json"), "{}").expect("a");
        fs::write(paths.done.join("a.job.json"), "stale").expect("stale done");

        let claimed = claim_next(&paths).expect("claim").expect("a");
        let mut result = JobResult::new("a", "a.job.json", false, "t0".to_string());
        let finalized = complete_done(&paths, &claimed, &mut result).expect("done");
        assert_eq!(fs::read_to_string(&finalized.final_path).expect("read"), "{}");
        assert!(!claimed.working_path.exists());
        let stored = read_result(&paths, "a").expect("read").expect("present");
        assert_eq!(stored.final_path, finalized.final_path.display().to_string());

        fs::write(paths.inbox.join("b.job.json"), "{}").expect("b");
        let claimed = claim_next(&paths).expect("claim").expect("b");
        let back = requeue(&paths, &claimed).expect("requeue");
        assert_eq!(back, paths.inbox.join("b.job.json"));
        assert!(!paths.results.join("b.result.json").exists());
    }

    #[test]
    fn dead_letter_records_failure_and_depths_count_each_directory() {
        let (_tmp, paths) = queue();
        fs::write(paths.inbox.join("x.job.json"), "{").expect("x");
        fs::write(paths.inbox.join("y.job.json"), "{}").expect("y");
        let claimed = claim_next(&paths).expect("claim").expect("x");
        let mut result = JobResult::new("x", "x.job.json", false, "t0".to_string());
        result.fail(ErrorKind::Parse, "bad json", None);
        complete_dead(&paths, &claimed, &mut result).expect("dead");

        let depths = queue_depths(&paths).expect("depths");
        assert_eq!(
            depths,
            QueueDepths {
                inbox: 1,
                working: 0,
                done: 0,
                dead: 1,
                results: 1,
            }
        );
        let stored = read_result(&paths, "x").expect("read").expect("present");
        assert_eq!(stored.status, JobStatus::Failed);
        assert!(read_result(&paths, "missing").expect("read").is_none());
    }
}
