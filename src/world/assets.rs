use super::object::{set_field_path, AssetId};
use super::WorldError;
use crate::shared::fs_atomic::atomic_write_file;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait AssetDatabase: Send {
    fn load_by_guid(&self, guid: &str) -> Option<AssetId>;
    fn load_by_path(&mut self, path: &str) -> Option<AssetId>;
    fn create(
        &mut self,
        path: &str,
        type_name: &str,
        fields: Map<String, Value>,
        overwrite: bool,
    ) -> Result<AssetId, WorldError>;
    fn path_of(&self, id: AssetId) -> Option<String>;
    fn guid_of(&self, id: AssetId) -> Option<String>;
    fn type_of(&self, id: AssetId) -> Option<String>;
    fn fields_of(&self, id: AssetId) -> Option<Map<String, Value>>;
    fn set_field(&mut self, id: AssetId, property_path: &str, value: Value) -> Result<(), WorldError>;
    fn dirty_assets(&self) -> Vec<AssetId>;
    fn save(&mut self, id: AssetId) -> Result<PathBuf, WorldError>;
    fn import(&mut self, path: &str, force: bool) -> Result<AssetId, WorldError>;
    fn asset_count(&self) -> usize;
}

pub fn guid_for_path(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_asset_path(path).as_bytes());
    let digest = hasher.finalize();
    digest[..16]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
}

fn normalize_asset_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AssetDocument {
    guid: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
struct AssetRecord {
    guid: String,
    path: String,
    type_name: String,
    fields: Map<String, Value>,
    editable: bool,
    dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FileAssetDatabase {
    project_root: PathBuf,
    records: Vec<AssetRecord>,
    by_guid: HashMap<String, AssetId>,
    by_path: HashMap<String, AssetId>,
}

impl FileAssetDatabase {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    fn absolute(&self, normalized: &str) -> PathBuf {
        normalized
            .split('/')
            .fold(self.project_root.clone(), |acc, part| acc.join(part))
    }

    fn record(&self, id: AssetId) -> Option<&AssetRecord> {
        self.records.get(id.0 as usize)
    }

    fn record_mut(&mut self, id: AssetId) -> Result<&mut AssetRecord, WorldError> {
        self.records
            .get_mut(id.0 as usize)
            .ok_or_else(|| WorldError::MissingObject(format!("asset #{}", id.0)))
    }

    fn insert(&mut self, record: AssetRecord) -> AssetId {
        if let Some(existing) = self.by_path.get(&record.path).copied() {
            self.by_guid.insert(record.guid.clone(), existing);
            self.records[existing.0 as usize] = record;
            return existing;
        }
        let id = AssetId(self.records.len() as u64);
        self.by_guid.insert(record.guid.clone(), id);
        self.by_path.insert(record.path.clone(), id);
        self.records.push(record);
        id
    }

    fn read_from_disk(&self, normalized: &str) -> Result<AssetRecord, WorldError> {
        let file = self.absolute(normalized);
        let bytes = fs::read(&file).map_err(|source| WorldError::Io {
            path: file.display().to_string(),
            source,
        })?;
        let record = match serde_json::from_slice::<AssetDocument>(&bytes) {
            Ok(document) => AssetRecord {
                guid: if document.guid.trim().is_empty() {
                    guid_for_path(normalized)
                } else {
                    document.guid
                },
                path: normalized.to_string(),
                type_name: document.type_name,
                fields: document.fields,
                editable: true,
                dirty: false,
            },
            Err(_) => AssetRecord {
                guid: guid_for_path(normalized),
                path: normalized.to_string(),
                type_name: default_type_for(normalized),
                fields: Map::new(),
                editable: false,
                dirty: false,
            },
        };
        Ok(record)
    }
}

fn default_type_for(path: &str) -> String {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let type_name = match extension.as_deref() {
        Some("png" | "jpg" | "jpeg" | "tga") => "Texture2D",
        Some("wav" | "ogg" | "mp3") => "AudioClip",
        Some("txt" | "json" | "md" | "csv") => "TextAsset",
        _ => "DefaultAsset",
    };
    type_name.to_string()
}

impl AssetDatabase for FileAssetDatabase {
    fn load_by_guid(&self, guid: &str) -> Option<AssetId> {
        self.by_guid.get(guid.trim()).copied()
    }

    fn load_by_path(&mut self, path: &str) -> Option<AssetId> {
        let normalized = normalize_asset_path(path);
        if normalized.is_empty() {
            return None;
        }
        if let Some(id) = self.by_path.get(&normalized) {
            return Some(*id);
        }
        if !self.absolute(&normalized).is_file() {
            return None;
        }
        let record = self.read_from_disk(&normalized).ok()?;
        Some(self.insert(record))
    }

    fn create(
        &mut self,
        path: &str,
        type_name: &str,
        fields: Map<String, Value>,
        overwrite: bool,
    ) -> Result<AssetId, WorldError> {
        let normalized = normalize_asset_path(path);
        if normalized.is_empty() {
            return Err(WorldError::Invalid("asset path must be non-empty".to_string()));
        }
        if type_name.trim().is_empty() {
            return Err(WorldError::Invalid("asset type must be non-empty".to_string()));
        }
        if !overwrite && self.load_by_path(&normalized).is_some() {
            return Err(WorldError::AlreadyExists(normalized));
        }
        let guid = self
            .by_path
            .get(&normalized)
            .and_then(|id| self.record(*id))
            .map(|record| record.guid.clone())
            .unwrap_or_else(|| guid_for_path(&normalized));
        Ok(self.insert(AssetRecord {
            guid,
            path: normalized,
            type_name: type_name.to_string(),
            fields,
            editable: true,
            dirty: true,
        }))
    }

    fn path_of(&self, id: AssetId) -> Option<String> {
        self.record(id).map(|record| record.path.clone())
    }

    fn guid_of(&self, id: AssetId) -> Option<String> {
        self.record(id).map(|record| record.guid.clone())
    }

    fn type_of(&self, id: AssetId) -> Option<String> {
        self.record(id).map(|record| record.type_name.clone())
    }

    fn fields_of(&self, id: AssetId) -> Option<Map<String, Value>> {
        self.record(id).map(|record| record.fields.clone())
    }

    fn set_field(
        &mut self,
        id: AssetId,
        property_path: &str,
        value: Value,
    ) -> Result<(), WorldError> {
        let record = self.record_mut(id)?;
        if !record.editable {
            return Err(WorldError::Invalid(format!(
                "asset `{}` of type {} has no serialized fields",
                record.path, record.type_name
            )));
        }
        set_field_path(&mut record.fields, property_path, value).map_err(WorldError::Invalid)?;
        record.dirty = true;
        Ok(())
    }

    fn dirty_assets(&self) -> Vec<AssetId> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.dirty)
            .map(|(index, _)| AssetId(index as u64))
            .collect()
    }

    fn save(&mut self, id: AssetId) -> Result<PathBuf, WorldError> {
        let record = self
            .record(id)
            .cloned()
            .ok_or_else(|| WorldError::MissingObject(format!("asset #{}", id.0)))?;
        let file = self.absolute(&record.path);
        if record.editable {
            let document = AssetDocument {
                guid: record.guid,
                type_name: record.type_name,
                fields: record.fields,
            };
            let body = serde_json::to_vec_pretty(&document).map_err(|source| WorldError::Json {
                path: file.display().to_string(),
                source,
            })?;
            atomic_write_file(&file, &body).map_err(|source| WorldError::Io {
                path: file.display().to_string(),
                source,
            })?;
        }
        self.record_mut(id)?.dirty = false;
        Ok(file)
    }

    fn import(&mut self, path: &str, force: bool) -> Result<AssetId, WorldError> {
        let normalized = normalize_asset_path(path);
        if !force {
            if let Some(id) = self.by_path.get(&normalized) {
                return Ok(*id);
            }
        }
        if !self.absolute(&normalized).is_file() {
            return Err(WorldError::MissingObject(format!("file `{normalized}`")));
        }
        let record = self.read_from_disk(&normalized)?;
        Ok(self.insert(record))
    }

    fn asset_count(&self) -> usize {
        self.records.len()
    }
}
