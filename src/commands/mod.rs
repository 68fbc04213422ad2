pub mod add_component;
pub mod create_game_object;
pub mod create_scriptable_object;
pub mod import_assets;
pub mod prefab;
pub mod save_assets;
pub mod selection;
pub mod set_property;
pub mod set_transform;
pub use add_component::AddComponent;
pub use create_game_object::CreateGameObject;
pub use create_scriptable_object::CreateScriptableObject;
pub use import_assets::ImportAssets;
pub use prefab::{CreateOrEditPrefab, InstantiatePrefabInScene, PREFAB_ROOT_VAR};
pub use save_assets::SaveAssets;
pub use selection::{PingObject, SelectObject};
pub use set_property::SetSerializedProperty;
pub use set_transform::SetTransform;

use crate::execution::args::optional_vec3_arg;
use crate::execution::{CommandExecResult, CommandRegistry, JobCommand, RegistryError};
use crate::world::{GameObjectId, Host, Vec3, WorldError};
use serde_json::{Map, Value};
use std::sync::Arc;

pub fn builtin_commands() -> Vec<Arc<dyn JobCommand>> {
    vec![
        Arc::new(CreateGameObject),
        Arc::new(AddComponent),
        Arc::new(SetTransform),
        Arc::new(SetSerializedProperty),
        Arc::new(CreateScriptableObject),
        Arc::new(ImportAssets),
        Arc::new(SaveAssets),
        Arc::new(PingObject),
        Arc::new(SelectObject),
        Arc::new(InstantiatePrefabInScene),
        Arc::new(CreateOrEditPrefab),
    ]
}

pub fn register_builtins(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    for command in builtin_commands() {
        registry.register(command)?;
    }
    Ok(())
}

pub(crate) type Outcome = Result<CommandExecResult, CommandExecResult>;

pub(crate) fn settle(outcome: Outcome) -> CommandExecResult {
    outcome.unwrap_or_else(|failure| failure)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct TransformArgs {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
}

impl TransformArgs {
    pub fn parse(args: &Map<String, Value>) -> Result<Self, CommandExecResult> {
        Ok(Self {
            position: optional_vec3_arg(args, "position")?,
            rotation: optional_vec3_arg(args, "rotation")?,
            scale: optional_vec3_arg(args, "scale")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    pub fn apply(&self, host: &mut Host, go: GameObjectId) -> Result<(), WorldError> {
        if self.is_empty() {
            return Ok(());
        }
        let mut transform = host
            .scene
            .transform_of(go)
            .ok_or_else(|| WorldError::MissingObject(format!("game object #{}", go.0)))?;
        if let Some(position) = self.position {
            transform.position = position;
        }
        if let Some(rotation) = self.rotation {
            transform.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            transform.scale = scale;
        }
        host.scene.set_transform(go, transform)
    }
}
