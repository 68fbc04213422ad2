use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub fn validate_job_id(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("job id must be non-empty".to_string());
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Ok(());
    }
    Err("job id must use only ASCII letters, digits, '-', '_' or '.'".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        validate_job_id(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn generate(prefix: &str) -> Self {
        let mut bytes = [0u8; 4];
        let suffix = match getrandom::getrandom(&mut bytes) {
            Ok(()) => bytes.iter().map(|b| format!("{b:02x}")).collect::<String>(),
            Err(_) => format!("{:08x}", std::process::id()),
        };
        Self(format!(
            "{}_{}_{}",
            sanitize_prefix(prefix),
            super::time::compact_utc_stamp(),
            suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect();
    if cleaned.is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::borrow::Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for JobId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|err| D::Error::custom(format!("invalid job id `{raw}`: {err}")))
    }
}
