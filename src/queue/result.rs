use crate::execution::{ErrorKind, LogEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RESULT_LOG_EXCERPT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "FAILED")]
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    pub index: usize,
    pub cmd: String,
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub success: bool,
    pub dry_run: bool,
    pub source_file: String,
    #[serde(default)]
    pub final_path: String,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub commands: Vec<CommandRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl JobResult {
    pub fn new(job_id: &str, source_file: &str, dry_run: bool, started_at_utc: String) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Done,
            success: true,
            dry_run,
            source_file: source_file.to_string(),
            final_path: String::new(),
            started_at_utc: started_at_utc.clone(),
            finished_at_utc: started_at_utc,
            elapsed_ms: 0,
            commands: Vec::new(),
            error: None,
            logs: Vec::new(),
        }
    }

    pub fn fail(&mut self, kind: ErrorKind, message: impl Into<String>, command_index: Option<usize>) {
        self.status = JobStatus::Failed;
        self.success = false;
        if self.error.is_none() {
            self.error = Some(JobError {
                kind,
                message: message.into(),
                command_index,
            });
        }
    }

    pub fn set_logs(&mut self, entries: &[LogEntry]) {
        let skip = entries.len().saturating_sub(RESULT_LOG_EXCERPT);
        self.logs = entries[skip..].to_vec();
    }
}
