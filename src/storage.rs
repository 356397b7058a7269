use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::{default_storage_key, StorageConfig};
use crate::error::RecipeError;
use crate::model::VideoId;

/// Local key-value storage for the saved list.
pub trait SavedStore: Send + Sync {
    /// Read the stored list. Missing data is an empty list, not an error.
    fn load(&self) -> Result<Vec<VideoId>, RecipeError>;

    /// Replace the stored list.
    fn store(&self, ids: &[VideoId]) -> Result<(), RecipeError>;
}

/// JSON object on disk; the saved list lives under a single key and other
/// keys in the file are preserved.
pub struct FileStore {
    path: PathBuf,
    key: String,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: default_storage_key(),
        }
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// `None` when the config keeps the saved set in memory only.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        config
            .path
            .as_ref()
            .map(|path| Self::with_key(path, config.key.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>, RecipeError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(&self.path, e)),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(RecipeError::PersistenceUnavailable(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(RecipeError::PersistenceUnavailable(format!(
                "corrupt store {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl SavedStore for FileStore {
    fn load(&self) -> Result<Vec<VideoId>, RecipeError> {
        let Some(mut document) = self.read_document()? else {
            debug!("No saved-recipe store at {}", self.path.display());
            return Ok(Vec::new());
        };

        match document.remove(&self.key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                RecipeError::PersistenceUnavailable(format!(
                    "corrupt '{}' entry in {}: {}",
                    self.key,
                    self.path.display(),
                    e
                ))
            }),
        }
    }

    fn store(&self, ids: &[VideoId]) -> Result<(), RecipeError> {
        // An unreadable document is overwritten rather than blocking the write
        let mut document = self.read_document().ok().flatten().unwrap_or_default();
        let list = serde_json::to_value(ids)
            .map_err(|e| RecipeError::PersistenceUnavailable(e.to_string()))?;
        document.insert(self.key.clone(), list);

        let body = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| RecipeError::PersistenceUnavailable(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| unavailable(parent, e))?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| unavailable(&self.path, e))?;

        debug!("Persisted {} saved recipes to {}", ids.len(), self.path.display());
        Ok(())
    }
}

fn unavailable(path: &Path, err: std::io::Error) -> RecipeError {
    RecipeError::PersistenceUnavailable(format!("{}: {}", path.display(), err))
}

/// In-process store, for embedding and tests.
#[derive(Default)]
pub struct MemoryStore {
    ids: Mutex<Vec<VideoId>>,
}

impl MemoryStore {
    pub fn new(ids: Vec<VideoId>) -> Self {
        Self {
            ids: Mutex::new(ids),
        }
    }

    pub fn snapshot(&self) -> Vec<VideoId> {
        self.ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SavedStore for MemoryStore {
    fn load(&self) -> Result<Vec<VideoId>, RecipeError> {
        Ok(self.snapshot())
    }

    fn store(&self, ids: &[VideoId]) -> Result<(), RecipeError> {
        *self
            .ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = ids.to_vec();
        Ok(())
    }
}
