use super::variables::VARIABLE_MARKER;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Var(String),
    Asset {
        guid: Option<String>,
        path: Option<String>,
    },
    ScenePath(String),
}

impl TargetRef {
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Err("target string must be non-empty".to_string())
                } else if trimmed.starts_with(VARIABLE_MARKER) {
                    Ok(Self::Var(trimmed.to_string()))
                } else {
                    Ok(Self::ScenePath(trimmed.to_string()))
                }
            }
            Value::Object(map) => {
                let text = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                };
                let var = text("ref");
                let guid = text("assetGuid");
                let path = text("assetPath");
                let scene = text("scenePath");

                let populated = [var.is_some(), guid.is_some() || path.is_some(), scene.is_some()]
                    .into_iter()
                    .filter(|set| *set)
                    .count();
                if populated != 1 {
                    return Err(format!(
                        "target must set exactly one of ref, assetGuid/assetPath or scenePath (found {populated})"
                    ));
                }

                if let Some(var) = var {
                    Ok(Self::Var(var))
                } else if let Some(scene) = scene {
                    Ok(Self::ScenePath(scene))
                } else {
                    Ok(Self::Asset { guid, path })
                }
            }
            other => Err(format!("target must be a string or object, got `{other}`")),
        }
    }

    pub fn var_name(&self) -> Option<&str> {
        match self {
            Self::Var(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "ref {name}"),
            Self::ScenePath(path) => write!(f, "scenePath {path}"),
            Self::Asset { guid, path } => match (guid, path) {
                (Some(guid), Some(path)) => write!(f, "asset {guid} ({path})"),
                (Some(guid), None) => write!(f, "assetGuid {guid}"),
                (None, Some(path)) => write!(f, "assetPath {path}"),
                (None, None) => f.write_str("asset <none>"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_each_tag_and_string_shorthand() {
        assert_eq!(
            TargetRef::from_value(&json!({"ref": "$go"})),
            Ok(TargetRef::Var("$go".to_string()))
        );
        assert_eq!(
            TargetRef::from_value(&json!({"assetGuid": "abc", "assetPath": "Assets/a.asset"})),
            Ok(TargetRef::Asset {
                guid: Some("abc".to_string()),
                path: Some("Assets/a.asset".to_string()),
            })
        );
        assert_eq!(
            TargetRef::from_value(&json!({"scenePath": "Level/Spawner"})),
            Ok(TargetRef::ScenePath("Level/Spawner".to_string()))
        );
        assert_eq!(
            TargetRef::from_value(&json!("$go")),
            Ok(TargetRef::Var("$go".to_string()))
        );
        assert_eq!(
            TargetRef::from_value(&json!("Level/Spawner")),
            Ok(TargetRef::ScenePath("Level/Spawner".to_string()))
        );
    }

    #[test]
    fn rejects_zero_or_multiple_tags() {
        assert!(TargetRef::from_value(&json!({})).is_err());
        assert!(TargetRef::from_value(&json!({"ref": ""})).is_err());
        assert!(TargetRef::from_value(&json!({"ref": "$a", "scenePath": "B"})).is_err());
        assert!(TargetRef::from_value(&json!({"ref": "$a", "assetPath": "x"})).is_err());
        assert!(TargetRef::from_value(&json!(42)).is_err());
        assert!(TargetRef::from_value(&json!("  ")).is_err());
    }
}
