use super::object::{set_field_path, ComponentId, GameObjectId, Transform};
use super::WorldError;
use crate::shared::fs_atomic::atomic_write_file;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub trait SceneGraph: Send {
    fn find_by_name(&self, name: &str) -> Option<GameObjectId>;
    fn find_by_path(&self, path: &str) -> Option<GameObjectId>;
    fn find_by_tag(&self, tag: &str) -> Option<GameObjectId>;
    fn create_object(&mut self, name: &str, parent: Option<GameObjectId>) -> Result<GameObjectId, WorldError>;
    fn name_of(&self, id: GameObjectId) -> Option<String>;
    fn path_of(&self, id: GameObjectId) -> Option<String>;
    fn tag_of(&self, id: GameObjectId) -> Option<String>;
    fn set_tag(&mut self, id: GameObjectId, tag: &str) -> Result<(), WorldError>;
    fn transform_of(&self, id: GameObjectId) -> Option<Transform>;
    fn set_transform(&mut self, id: GameObjectId, transform: Transform) -> Result<(), WorldError>;
    fn add_component(&mut self, id: GameObjectId, type_name: &str) -> Result<ComponentId, WorldError>;
    fn component_of(&self, id: GameObjectId, type_name: Option<&str>) -> Option<ComponentId>;
    fn owner_of(&self, component: ComponentId) -> Option<GameObjectId>;
    fn component_type(&self, component: ComponentId) -> Option<String>;
    fn children_of(&self, id: GameObjectId) -> Vec<GameObjectId>;
    fn components_of(&self, id: GameObjectId) -> Vec<ComponentId>;
    fn component_fields_of(&self, component: ComponentId) -> Option<Map<String, Value>>;
    fn set_component_field(
        &mut self,
        component: ComponentId,
        property_path: &str,
        value: Value,
    ) -> Result<(), WorldError>;
    fn object_count(&self) -> usize;
    fn is_dirty(&self) -> bool;
    fn save(&mut self) -> Result<Option<PathBuf>, WorldError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GameObjectRecord {
    name: String,
    #[serde(default)]
    parent: Option<GameObjectId>,
    #[serde(default)]
    children: Vec<GameObjectId>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    transform: Transform,
    #[serde(default)]
    components: Vec<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ComponentRecord {
    type_name: String,
    owner: GameObjectId,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryScene {
    #[serde(default)]
    objects: Vec<GameObjectRecord>,
    #[serde(default)]
    components: Vec<ComponentRecord>,
    #[serde(skip)]
    file: Option<PathBuf>,
    #[serde(skip)]
    dirty: bool,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(file: &Path) -> Result<Self, WorldError> {
        let mut scene = match fs::read_to_string(file) {
            Ok(raw) if raw.trim().is_empty() => Self::default(),
            Ok(raw) => serde_json::from_str::<MemoryScene>(&raw).map_err(|source| {
                WorldError::Json {
                    path: file.display().to_string(),
                    source,
                }
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(WorldError::Io {
                    path: file.display().to_string(),
                    source,
                })
            }
        };
        scene.file = Some(file.to_path_buf());
        Ok(scene)
    }

    pub fn roots(&self) -> Vec<GameObjectId> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, record)| record.parent.is_none())
            .map(|(index, _)| GameObjectId(index as u64))
            .collect()
    }

    pub fn component_fields(&self, component: ComponentId) -> Option<&Map<String, Value>> {
        self.components
            .get(component.0 as usize)
            .map(|record| &record.fields)
    }

    fn object(&self, id: GameObjectId) -> Option<&GameObjectRecord> {
        self.objects.get(id.0 as usize)
    }

    fn object_mut(&mut self, id: GameObjectId) -> Result<&mut GameObjectRecord, WorldError> {
        self.objects
            .get_mut(id.0 as usize)
            .ok_or_else(|| WorldError::MissingObject(format!("game object #{}", id.0)))
    }

    fn child_named(&self, parent: GameObjectId, name: &str) -> Option<GameObjectId> {
        self.object(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.object(*child).is_some_and(|r| r.name == name))
    }
}

impl SceneGraph for MemoryScene {
    fn find_by_name(&self, name: &str) -> Option<GameObjectId> {
        self.objects
            .iter()
            .position(|record| record.name == name)
            .map(|index| GameObjectId(index as u64))
    }

    fn find_by_path(&self, path: &str) -> Option<GameObjectId> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let mut current = self
            .roots()
            .into_iter()
            .find(|root| self.object(*root).is_some_and(|r| r.name == first))?;
        for segment in segments {
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    fn find_by_tag(&self, tag: &str) -> Option<GameObjectId> {
        self.objects
            .iter()
            .position(|record| record.tag.as_deref() == Some(tag))
            .map(|index| GameObjectId(index as u64))
    }

    fn create_object(
        &mut self,
        name: &str,
        parent: Option<GameObjectId>,
    ) -> Result<GameObjectId, WorldError> {
        if name.trim().is_empty() {
            return Err(WorldError::Invalid("game object name must be non-empty".to_string()));
        }
        let id = GameObjectId(self.objects.len() as u64);
        if let Some(parent) = parent {
            self.object_mut(parent)?.children.push(id);
        }
        self.objects.push(GameObjectRecord {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            tag: None,
            transform: Transform::default(),
            components: Vec::new(),
        });
        self.dirty = true;
        Ok(id)
    }

    fn name_of(&self, id: GameObjectId) -> Option<String> {
        self.object(id).map(|record| record.name.clone())
    }

    fn path_of(&self, id: GameObjectId) -> Option<String> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let record = self.object(current)?;
            names.push(record.name.clone());
            cursor = record.parent;
        }
        names.reverse();
        Some(names.join("/"))
    }

    fn tag_of(&self, id: GameObjectId) -> Option<String> {
        self.object(id).and_then(|record| record.tag.clone())
    }

    fn set_tag(&mut self, id: GameObjectId, tag: &str) -> Result<(), WorldError> {
        self.object_mut(id)?.tag = Some(tag.to_string());
        self.dirty = true;
        Ok(())
    }

    fn transform_of(&self, id: GameObjectId) -> Option<Transform> {
        self.object(id).map(|record| record.transform)
    }

    fn set_transform(&mut self, id: GameObjectId, transform: Transform) -> Result<(), WorldError> {
        self.object_mut(id)?.transform = transform;
        self.dirty = true;
        Ok(())
    }

    fn add_component(
        &mut self,
        id: GameObjectId,
        type_name: &str,
    ) -> Result<ComponentId, WorldError> {
        if type_name.trim().is_empty() {
            return Err(WorldError::Invalid("component type must be non-empty".to_string()));
        }
        let component = ComponentId(self.components.len() as u64);
        self.object_mut(id)?.components.push(component);
        self.components.push(ComponentRecord {
            type_name: type_name.to_string(),
            owner: id,
            fields: Map::new(),
        });
        self.dirty = true;
        Ok(component)
    }

    fn component_of(&self, id: GameObjectId, type_name: Option<&str>) -> Option<ComponentId> {
        self.object(id)?.components.iter().copied().find(|component| {
            match (type_name, self.components.get(component.0 as usize)) {
                (None, Some(_)) => true,
                (Some(wanted), Some(record)) => record.type_name.eq_ignore_ascii_case(wanted),
                (_, None) => false,
            }
        })
    }

    fn owner_of(&self, component: ComponentId) -> Option<GameObjectId> {
        self.components
            .get(component.0 as usize)
            .map(|record| record.owner)
    }

    fn component_type(&self, component: ComponentId) -> Option<String> {
        self.components
            .get(component.0 as usize)
            .map(|record| record.type_name.clone())
    }

    fn children_of(&self, id: GameObjectId) -> Vec<GameObjectId> {
        self.object(id)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    fn components_of(&self, id: GameObjectId) -> Vec<ComponentId> {
        self.object(id)
            .map(|record| record.components.clone())
            .unwrap_or_default()
    }

    fn component_fields_of(&self, component: ComponentId) -> Option<Map<String, Value>> {
        self.component_fields(component).cloned()
    }

    fn set_component_field(
        &mut self,
        component: ComponentId,
        property_path: &str,
        value: Value,
    ) -> Result<(), WorldError> {
        let record = self
            .components
            .get_mut(component.0 as usize)
            .ok_or_else(|| WorldError::MissingObject(format!("component #{}", component.0)))?;
        set_field_path(&mut record.fields, property_path, value).map_err(WorldError::Invalid)?;
        self.dirty = true;
        Ok(())
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn save(&mut self) -> Result<Option<PathBuf>, WorldError> {
        let Some(file) = self.file.clone() else {
            self.dirty = false;
            return Ok(None);
        };
        let body = serde_json::to_vec_pretty(self).map_err(|source| WorldError::Json {
            path: file.display().to_string(),
            source,
        })?;
        atomic_write_file(&file, &body).map_err(|source| WorldError::Io {
            path: file.display().to_string(),
            source,
        })?;
        self.dirty = false;
        Ok(Some(file))
    }
}
