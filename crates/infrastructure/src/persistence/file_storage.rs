//! Durable key-value storage in a JSON file.
//!
//! Stores the session entries in the platform-specific data directory by
//! default:
//! - Linux: ~/.local/share/warden/session.json
//! - macOS: ~/Library/Application Support/warden/session.json
//! - Windows: %APPDATA%/warden/session.json

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, error};
use warden_application::ports::{KeyValueStorage, StorageError};

/// File name of the storage file inside the data directory.
pub const STORAGE_FILE_NAME: &str = "session.json";

/// Key-value storage persisted as a pretty-printed JSON object.
///
/// Every change is written through to disk. Write failures are logged and
/// otherwise ignored, so the in-memory view stays authoritative for the
/// rest of the process.
#[derive(Debug)]
pub struct FileKeyValueStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStorage {
    /// Opens the storage file at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object
    /// of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(content) if content.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(content) => serde_json::from_slice(&content)
                .map_err(|e| StorageError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };
        debug!(path = %path.display(), entries = entries.len(), "opened session storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Opens the storage file in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory exists or the file is unreadable.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(Self::default_path().ok_or(StorageError::NoDataDir)?)
    }

    /// Returns the default storage path, if a data directory is available.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("warden").join(STORAGE_FILE_NAME))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) {
        if let Err(e) = write_atomically(&self.path, entries) {
            error!(path = %self.path.display(), error = %e, "failed to persist session storage");
        }
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_vec_pretty(entries).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

impl KeyValueStorage for FileKeyValueStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        if entries.get(key).map(String::as_str) == Some(value) {
            return;
        }
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}

/// Key-value storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileKeyValueStorage::open(dir.path().join("session.json")).unwrap();
        assert_eq!(storage.get("bearerToken"), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileKeyValueStorage::open(&path).unwrap();
        storage.set("bearerToken", "abc.def.ghi");
        storage.set("authClient", "db");
        drop(storage);

        let reopened = FileKeyValueStorage::open(&path).unwrap();
        assert_eq!(reopened.get("bearerToken").as_deref(), Some("abc.def.ghi"));
        assert_eq!(reopened.get("authClient").as_deref(), Some("db"));
    }

    #[test]
    fn test_remove_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileKeyValueStorage::open(&path).unwrap();
        storage.set("bearerToken", "abc");
        storage.remove("bearerToken");
        storage.remove("missing");

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "{}");
        assert_eq!(FileKeyValueStorage::open(&path).unwrap().get("bearerToken"), None);
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            FileKeyValueStorage::open(&path),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn test_empty_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "\n").unwrap();
        assert_eq!(FileKeyValueStorage::open(&path).unwrap().get("x"), None);
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = FileKeyValueStorage::default_path() {
            assert!(path.ends_with("warden/session.json"));
        }
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryKeyValueStorage::new();
        storage.set("k", "v");
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        storage.remove("k");
        assert_eq!(storage.get("k"), None);
    }
}
