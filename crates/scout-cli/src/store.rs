//! JSON file implementation of the settings store.
//!
//! The file holds one JSON object whose top-level keys are store keys. Writes go
//! to a uniquely named, owner-only temp file in the same directory, which is then
//! persisted over the original.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use scout_core::{SettingsStore, StoreError};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(error.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(document) => Ok(document),
            other => Err(StoreError::Backend(format!(
                "{} must contain a JSON object, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        let parent = match self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        // Created 0600 on unix, so credentials are never readable by others.
        let mut staging = tempfile::NamedTempFile::new_in(parent)?;
        staging.write_all(&serde_json::to_vec_pretty(document)?)?;
        staging.as_file().sync_all()?;
        staging.persist(&self.path).map_err(|error| error.error)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read_document()?.contains_key(key))
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_document()?.remove(key))
    }

    fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut document = self.read_document()?;
        document.insert(key.to_owned(), value);
        self.write_document(&document)
    }
}

/// `$XDG_CONFIG_HOME/scout/settings.json`, then `$HOME/.config/scout/settings.json`.
pub fn default_config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|value| !value.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("scout").join("settings.json")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(!store.exists("search").expect("exists"));
        assert_eq!(store.load("search").expect("load"), None);
    }

    #[test]
    fn save_creates_parent_directories_and_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.json");
        let store = JsonFileStore::new(&path);

        store.save("other", json!({"keep": true})).expect("first save");
        store.save("search", json!({"primary": "alpha"})).expect("second save");

        assert!(store.exists("search").expect("exists"));
        assert_eq!(
            store.load("search").expect("load"),
            Some(json!({"primary": "alpha"}))
        );
        assert_eq!(store.load("other").expect("load"), Some(json!({"keep": true})));

        let entries = fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .count();
        assert_eq!(entries, 1, "no staging files left behind");
    }

    #[test]
    fn concurrent_saves_never_leave_a_torn_document() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");

        let writers = (0..8)
            .map(|index| {
                let store = JsonFileStore::new(&path);
                std::thread::spawn(move || {
                    store
                        .save("search", json!({"writer": index}))
                        .expect("save");
                })
            })
            .collect::<Vec<_>>();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        let raw = fs::read_to_string(&path).expect("settings file");
        let document = serde_json::from_str::<Value>(&raw).expect("whole document");
        assert!(document["search"]["writer"].is_u64());
        assert_eq!(fs::read_dir(dir.path()).expect("list dir").count(), 1);
    }

    #[test]
    fn non_object_document_is_a_backend_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").expect("write fixture");

        let error = JsonFileStore::new(&path)
            .load("search")
            .expect_err("arrays are rejected");

        assert!(matches!(error, StoreError::Backend(_)));
        assert!(error.to_string().contains("an array"));
    }

    #[test]
    fn corrupt_document_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").expect("write fixture");

        let error = JsonFileStore::new(&path)
            .exists("search")
            .expect_err("corrupt file");

        assert!(matches!(error, StoreError::Serialization(_)));
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        JsonFileStore::new(&path)
            .save("search", json!({}))
            .expect("save");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
