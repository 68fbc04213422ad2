use super::context::CommandContext;
use crate::world::ObjectRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ParseError")]
    Parse,
    PolicyViolation,
    UnknownCommand,
    ResolutionMiss,
    CommandFailure,
    #[serde(rename = "PreflightError")]
    Preflight,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "ParseError",
            Self::PolicyViolation => "PolicyViolation",
            Self::UnknownCommand => "UnknownCommand",
            Self::ResolutionMiss => "ResolutionMiss",
            Self::CommandFailure => "CommandFailure",
            Self::Preflight => "PreflightError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecResult {
    pub success: bool,
    pub message: String,
    pub error_kind: Option<ErrorKind>,
    pub outputs: Vec<(String, ObjectRef)>,
}

impl CommandExecResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_kind: None,
            outputs: Vec::new(),
        }
    }

    pub fn fail(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_kind: Some(kind),
            outputs: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::fail(ErrorKind::CommandFailure, message)
    }

    pub fn policy_violation(message: impl Into<String>) -> Self {
        Self::fail(ErrorKind::PolicyViolation, message)
    }

    pub fn resolution_miss(message: impl Into<String>) -> Self {
        Self::fail(ErrorKind::ResolutionMiss, message)
    }

    pub fn with_output(mut self, name: &str, object: ObjectRef) -> Self {
        if self.success {
            self.outputs.retain(|(existing, _)| existing != name);
            self.outputs.push((name.to_string(), object));
        }
        self
    }

    pub fn output(&self, name: &str) -> Option<ObjectRef> {
        self.outputs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, object)| *object)
    }
}

pub trait JobCommand: Send + Sync {
    fn name(&self) -> &str;
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &Map<String, Value>) -> CommandExecResult;
}
