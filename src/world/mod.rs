pub mod assets;
pub mod object;
pub mod prefab;
pub mod scene;
pub use assets::{guid_for_path, AssetDatabase, FileAssetDatabase};
pub use object::{
    AssetId, Capability, ComponentId, GameObjectId, ObjectKind, ObjectRef, Transform, Vec3,
};
pub use prefab::{PrefabComponent, PrefabNode, PREFAB_TYPE};
pub use scene::{MemoryScene, SceneGraph};

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("world io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid world document {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} does not exist")]
    MissingObject(String),
    #[error("asset already exists at {0}")]
    AlreadyExists(String),
    #[error("{0}")]
    Invalid(String),
}

pub struct Host {
    pub scene: Box<dyn SceneGraph>,
    pub assets: Box<dyn AssetDatabase>,
    pub selection: Vec<ObjectRef>,
    pub pinged: Vec<ObjectRef>,
}

impl Host {
    pub fn new(scene: Box<dyn SceneGraph>, assets: Box<dyn AssetDatabase>) -> Self {
        Self {
            scene,
            assets,
            selection: Vec::new(),
            pinged: Vec::new(),
        }
    }

    pub fn in_memory(project_root: &Path) -> Self {
        Self::new(
            Box::new(MemoryScene::new()),
            Box::new(FileAssetDatabase::new(project_root)),
        )
    }

    pub fn open(project_root: &Path, scene_file: &str) -> Result<Self, WorldError> {
        let scene = MemoryScene::open(&project_root.join(scene_file))?;
        Ok(Self::new(
            Box::new(scene),
            Box::new(FileAssetDatabase::new(project_root)),
        ))
    }

    pub fn exists(&self, object: ObjectRef) -> bool {
        match object {
            ObjectRef::GameObject(id) => self.scene.name_of(id).is_some(),
            ObjectRef::Component(id) => self.scene.component_type(id).is_some(),
            ObjectRef::Asset(id) => self.assets.path_of(id).is_some(),
        }
    }

    pub fn describe(&self, object: ObjectRef) -> String {
        match object {
            ObjectRef::GameObject(id) => match self.scene.path_of(id) {
                Some(path) => format!("GameObject '{path}'"),
                None => format!("GameObject #{} (missing)", id.0),
            },
            ObjectRef::Component(id) => {
                let type_name = self
                    .scene
                    .component_type(id)
                    .unwrap_or_else(|| "Component".to_string());
                match self.scene.owner_of(id).and_then(|owner| self.scene.path_of(owner)) {
                    Some(owner) => format!("{type_name} on '{owner}'"),
                    None => format!("{type_name} #{} (missing)", id.0),
                }
            }
            ObjectRef::Asset(id) => {
                let type_name = self
                    .assets
                    .type_of(id)
                    .unwrap_or_else(|| "Asset".to_string());
                match self.assets.path_of(id) {
                    Some(path) => format!("{type_name} at '{path}'"),
                    None => format!("{type_name} #{} (missing)", id.0),
                }
            }
        }
    }
}
