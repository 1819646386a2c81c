//! Local look persistence
//!
//! Saved looks are kept per mode and gender so the editor can reopen on
//! the last look the user saved there.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figura_core::{FiguraError, FiguraResult, Gender};
use tracing::debug;

/// Key of the restricted-mode look for a gender
pub fn restricted_key(gender: Gender) -> String {
    format!("look.restricted.{}", gender.code())
}

/// Key of the normal-mode look for a gender
pub fn normal_key(gender: Gender) -> String {
    format!("look.normal.{}", gender.code())
}

/// Key/value store of figure strings
pub trait LookStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, figure: &str) -> FiguraResult<()>;
}

/// Non-persistent store
#[derive(Debug, Clone, Default)]
pub struct MemoryLookStore {
    looks: BTreeMap<String, String>,
}

impl MemoryLookStore {
    pub fn new() -> Self {
        MemoryLookStore::default()
    }

    pub fn len(&self) -> usize {
        self.looks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.looks.is_empty()
    }
}

impl LookStore for MemoryLookStore {
    fn get(&self, key: &str) -> Option<String> {
        self.looks.get(key).cloned()
    }

    fn set(&mut self, key: &str, figure: &str) -> FiguraResult<()> {
        self.looks.insert(key.to_string(), figure.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object on disk. Every write rewrites the file.
#[derive(Debug)]
pub struct JsonFileLookStore {
    path: PathBuf,
    looks: BTreeMap<String, String>,
}

impl JsonFileLookStore {
    /// Open the store; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> FiguraResult<Self> {
        let path = path.as_ref().to_path_buf();
        let looks: BTreeMap<String, String> = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(FiguraError::StoreSerialization)?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), looks = looks.len(), "look store opened");
        Ok(JsonFileLookStore { path, looks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> FiguraResult<()> {
        let raw =
            serde_json::to_string_pretty(&self.looks).map_err(FiguraError::StoreSerialization)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl LookStore for JsonFileLookStore {
    fn get(&self, key: &str) -> Option<String> {
        self.looks.get(key).cloned()
    }

    fn set(&mut self, key: &str, figure: &str) -> FiguraResult<()> {
        self.looks.insert(key.to_string(), figure.to_string());
        self.flush()
    }
}
