use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    GameObject(GameObjectId),
    Component(ComponentId),
    Asset(AssetId),
}

impl ObjectRef {
    pub fn kind(self) -> ObjectKind {
        match self {
            Self::GameObject(_) => ObjectKind::GameObject,
            Self::Component(_) => ObjectKind::Component,
            Self::Asset(_) => ObjectKind::Asset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    GameObject,
    Component,
    Asset,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameObject => "GameObject",
            Self::Component => "Component",
            Self::Asset => "Asset",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    GameObject,
    Component(Option<String>),
    Asset,
}

impl Capability {
    pub fn component(type_name: &str) -> Self {
        Self::Component(Some(type_name.to_string()))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameObject => f.write_str("GameObject"),
            Self::Component(Some(type_name)) => write!(f, "Component<{type_name}>"),
            Self::Component(None) => f.write_str("Component"),
            Self::Asset => f.write_str("Asset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) if items.len() == 2 || items.len() == 3 => {
                let mut parts = [0.0; 3];
                for (slot, item) in parts.iter_mut().zip(items) {
                    *slot = item
                        .as_f64()
                        .ok_or_else(|| format!("vector component `{item}` is not a number"))?;
                }
                Ok(Self::new(parts[0], parts[1], parts[2]))
            }
            Value::Object(map) => {
                let axis = |name: &str| -> Result<f64, String> {
                    match map.get(name) {
                        None | Some(Value::Null) => Ok(0.0),
                        Some(v) => v
                            .as_f64()
                            .ok_or_else(|| format!("vector field `{name}` is not a number")),
                    }
                };
                Ok(Self::new(axis("x")?, axis("y")?, axis("z")?))
            }
            other => Err(format!(
                "expected [x, y, z], [x, y] or {{x, y, z}}, got `{other}`"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

pub fn set_field_path(fields: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), String> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(format!("invalid property path `{path}`"));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(format!("invalid property path `{path}`"));
    };

    let mut cursor = fields;
    for segment in parents {
        let slot = cursor
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        cursor = slot
            .as_object_mut()
            .ok_or_else(|| format!("property `{segment}` in `{path}` is not an object"))?;
    }
    cursor.insert((*last).to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vectors_accept_array_pair_and_object_forms() {
        assert_eq!(Vec3::from_value(&json!([1, 2, 3])), Ok(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(Vec3::from_value(&json!([1.5, 2])), Ok(Vec3::new(1.5, 2.0, 0.0)));
        assert_eq!(
            Vec3::from_value(&json!({"x": 1, "z": -2})),
            Ok(Vec3::new(1.0, 0.0, -2.0))
        );
        assert!(Vec3::from_value(&json!([1])).is_err());
        assert!(Vec3::from_value(&json!("1,2,3")).is_err());
        assert!(Vec3::from_value(&json!(["a", 2, 3])).is_err());
    }

    #[test]
    fn field_paths_create_nested_objects() {
        let mut fields = Map::new();
        set_field_path(&mut fields, "stats.speed", json!(4)).expect("nested");
        set_field_path(&mut fields, "label", json!("fast")).expect("flat");
        assert_eq!(Value::Object(fields.clone()), json!({"stats": {"speed": 4}, "label": "fast"}));

        assert!(set_field_path(&mut fields, "label.inner", json!(1)).is_err());
        assert!(set_field_path(&mut fields, "a..b", json!(1)).is_err());
    }
}
