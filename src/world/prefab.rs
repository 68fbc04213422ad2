use super::object::{GameObjectId, Transform};
use super::scene::SceneGraph;
use super::WorldError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PREFAB_TYPE: &str = "Prefab";
const ROOT_FIELD: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabComponent {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<PrefabComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PrefabNode>,
}

impl PrefabNode {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: None,
            transform: Transform::default(),
            components: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, WorldError> {
        let root = fields
            .get(ROOT_FIELD)
            .ok_or_else(|| WorldError::Invalid("prefab has no root object".to_string()))?;
        serde_json::from_value(root.clone())
            .map_err(|err| WorldError::Invalid(format!("invalid prefab root: {err}")))
    }

    pub fn to_fields(&self) -> Result<Map<String, Value>, WorldError> {
        let root = serde_json::to_value(self)
            .map_err(|err| WorldError::Invalid(format!("prefab root is not serializable: {err}")))?;
        let mut fields = Map::new();
        fields.insert(ROOT_FIELD.to_string(), root);
        Ok(fields)
    }

    pub fn capture(scene: &dyn SceneGraph, id: GameObjectId) -> Result<Self, WorldError> {
        let name = scene
            .name_of(id)
            .ok_or_else(|| WorldError::MissingObject(format!("game object #{}", id.0)))?;
        let components = scene
            .components_of(id)
            .into_iter()
            .filter_map(|component| {
                Some(PrefabComponent {
                    type_name: scene.component_type(component)?,
                    fields: scene.component_fields_of(component).unwrap_or_default(),
                })
            })
            .collect();
        let children = scene
            .children_of(id)
            .into_iter()
            .map(|child| Self::capture(scene, child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name,
            tag: scene.tag_of(id),
            transform: scene.transform_of(id).unwrap_or_default(),
            components,
            children,
        })
    }

    pub fn instantiate(
        &self,
        scene: &mut dyn SceneGraph,
        parent: Option<GameObjectId>,
    ) -> Result<GameObjectId, WorldError> {
        let go = scene.create_object(&self.name, parent)?;
        if let Some(tag) = &self.tag {
            scene.set_tag(go, tag)?;
        }
        scene.set_transform(go, self.transform)?;
        for component in &self.components {
            let id = scene.add_component(go, &component.type_name)?;
            for (property, value) in &component.fields {
                scene.set_component_field(id, property, value.clone())?;
            }
        }
        for child in &self.children {
            child.instantiate(scene, Some(go))?;
        }
        Ok(go)
    }
}
