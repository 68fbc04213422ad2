use super::command::CommandExecResult;
use crate::world::Vec3;
use serde_json::{Map, Value};

pub fn required_string_arg(args: &Map<String, Value>, key: &str) -> Result<String, CommandExecResult> {
    match args.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(CommandExecResult::failure(
            format!("Missing '{key}' argument"),
        )),
        Some(other) => Err(CommandExecResult::failure(format!(
            "Argument '{key}' must be a string, got `{other}`"
        ))),
    }
}

pub fn optional_string_arg(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, CommandExecResult> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.trim().is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim().to_string())),
        Some(other) => Err(CommandExecResult::failure(format!(
            "Argument '{key}' must be a string, got `{other}`"
        ))),
    }
}

pub fn optional_bool_arg(
    args: &Map<String, Value>,
    key: &str,
    default: bool,
) -> Result<bool, CommandExecResult> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(CommandExecResult::failure(format!(
            "Argument '{key}' must be a boolean, got `{other}`"
        ))),
    }
}

pub fn optional_vec3_arg(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<Vec3>, CommandExecResult> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Vec3::from_value(value)
            .map(Some)
            .map_err(|err| CommandExecResult::failure(format!("Argument '{key}': {err}"))),
    }
}

pub fn string_list_arg(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Vec<String>, CommandExecResult> {
    match args.get(key) {
        Some(Value::String(single)) if !single.trim().is_empty() => {
            Ok(vec![single.trim().to_string()])
        }
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item.as_str().map(str::trim) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(CommandExecResult::failure(format!(
                    "Argument '{key}' must contain non-empty strings"
                ))),
            })
            .collect(),
        _ => Err(CommandExecResult::failure(format!(
            "Missing '{key}' argument"
        ))),
    }
}
