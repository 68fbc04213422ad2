pub mod logging;
pub mod poller;
pub mod recovery;
pub mod runner;

pub use logging::append_runner_log;
pub use poller::Backoff;
pub use recovery::{recover_stale_working, RecoveredJob, ORPHANED_MESSAGE};
pub use runner::{FinishedJob, JobOutcome, JobRunner, RunnerError, RunnerStats, RunnerStatus};
