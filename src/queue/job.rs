use crate::shared::ids::validate_job_id;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum JobParseError {
    #[error("malformed job json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Stop,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInvocation {
    pub cmd: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub out: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub job_id: String,
    #[serde(
        default,
        alias = "writeRoot",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_write_root: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default)]
    pub runner_min_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_utc: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandInvocation>,
    #[serde(default, alias = "metadata", skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Job {
    pub fn parse(raw: &str, fallback_id: &str) -> Result<Self, JobParseError> {
        let mut job: Job = serde_json::from_str(raw)?;
        if job.job_id.trim().is_empty() {
            job.job_id = fallback_id.to_string();
        }
        validate_job_id(&job.job_id)
            .map_err(|err| JobParseError::Invalid(format!("jobId `{}`: {err}", job.job_id)))?;
        if job.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(JobParseError::Invalid(format!(
                "unsupported schemaVersion {} (supported: {SUPPORTED_SCHEMA_VERSION})",
                job.schema_version
            )));
        }
        if let Some(index) = job.commands.iter().position(|c| c.cmd.trim().is_empty()) {
            return Err(JobParseError::Invalid(format!(
                "commands[{index}].cmd must be non-empty"
            )));
        }
        Ok(job)
    }

    pub fn write_root<'a>(&'a self, default_write_root: &'a str) -> &'a str {
        self.project_write_root
            .as_deref()
            .filter(|root| !root.trim().is_empty())
            .unwrap_or(default_write_root)
    }
}

fn default_schema_version() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_job_takes_defaults_and_file_stem() {
        let job = Job::parse(r#"{"commands":[{"cmd":"SaveAssets"}]}"#, "hello").expect("parse");
        assert_eq!(job.job_id, "hello");
        assert_eq!(job.schema_version, 1);
        assert!(!job.dry_run);
        assert_eq!(job.on_error, OnError::Stop);
        assert_eq!(job.write_root("Assets/AutoGen"), "Assets/AutoGen");
        assert!(job.commands[0].args.is_empty());
    }

    #[test]
    fn aliases_and_unknown_fields_are_accepted() {
        let raw = json!({
            "jobId": "t1",
            "writeRoot": "Assets/AutoGen/Levels",
            "metadata": {"source": "agent"},
            "onError": "continue",
            "requiresTypes": ["Foo"],
            "commands": [
                {"cmd": "CreateThing", "args": {"name": "Spawner"}, "out": {"thing": "$spawner"}}
            ]
        });
        let job = Job::parse(&raw.to_string(), "ignored").expect("parse");
        assert_eq!(job.job_id, "t1");
        assert_eq!(job.write_root("Assets/AutoGen"), "Assets/AutoGen/Levels");
        assert_eq!(job.meta["source"], "agent");
        assert_eq!(job.on_error, OnError::Continue);
        assert_eq!(job.commands[0].out["thing"], "$spawner");
    }

    #[test]
    fn rejects_other_schemas_bad_ids_and_blank_commands() {
        assert!(matches!(
            Job::parse(r#"{"schemaVersion":2}"#, "a"),
            Err(JobParseError::Invalid(_))
        ));
        assert!(matches!(
            Job::parse(r#"{"schemaVersion":0}"#, "a"),
            Err(JobParseError::Invalid(_))
        ));
        assert!(Job::parse(r#"{"schemaVersion":1}"#, "a").is_ok());
        assert!(matches!(
            Job::parse(r#"{"jobId":"../x"}"#, "a"),
            Err(JobParseError::Invalid(_))
        ));
        assert!(matches!(
            Job::parse(r#"{"commands":[{"cmd":" "}]}"#, "a"),
            Err(JobParseError::Invalid(_))
        ));
        assert!(matches!(
            Job::parse("{not json", "a"),
            Err(JobParseError::Json(_))
        ));
    }
}
