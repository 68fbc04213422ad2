use crate::shared::time::now_rfc3339;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct JobLog {
    job_id: String,
    verbose: bool,
    command: Option<String>,
    entries: Vec<LogEntry>,
    file: Option<PathBuf>,
}

impl JobLog {
    pub fn new(job_id: &str, verbose: bool) -> Self {
        Self {
            job_id: job_id.to_string(),
            verbose,
            command: None,
            entries: Vec::new(),
            file: None,
        }
    }

    pub fn with_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_path_buf());
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn set_command(&mut self, command: Option<String>) {
        self.command = command;
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if level == LogLevel::Debug && !self.verbose {
            return;
        }
        let entry = LogEntry {
            timestamp: now_rfc3339(),
            level,
            command: self.command.clone(),
            message,
        };
        if let Some(path) = &self.file {
            append_entry(path, &entry);
        }
        self.entries.push(entry);
    }
}

fn append_entry(path: &Path, entry: &LogEntry) {
    let Ok(line) = serde_json::to_string(entry) else {
        return;
    };
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
