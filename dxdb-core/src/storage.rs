/// File storage for definition, data and counter files
///
/// Every file is replaced whole. The directory backend writes a temporary
/// sibling, optionally fsyncs it and renames it over the target, so a
/// reader sees either the old or the new content. The memory backend keeps
/// files in a map for tests and temporary databases.
use crate::error::Result;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

pub trait Storage: Send + Sync {
    /// Read a whole file; `None` when it does not exist
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace a file with new content
    fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Remove a file; removing a missing file succeeds
    fn remove(&self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.read(name)?.is_some())
    }

    /// Human-readable location, for logs
    fn location(&self) -> String;
}

/// Files under a directory on disk
pub struct DirectoryStorage {
    folder: PathBuf,
    sync: bool,
}

impl DirectoryStorage {
    pub fn new(folder: impl AsRef<Path>) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            sync: true,
        }
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    fn path(&self, name: &str) -> PathBuf {
        self.folder.join(name)
    }
}

impl Storage for DirectoryStorage {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(name)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.folder)?;

        let target = self.path(name);
        let temp = self.path(&format!("{}.tmp", name));
        let written = File::create(&temp)
            .and_then(|mut file| {
                file.write_all(data)?;
                if self.sync {
                    file.sync_all()?;
                }
                Ok(())
            })
            .and_then(|()| fs::rename(&temp, &target));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", temp.display(), cleanup);
                }
            }
            return Err(e.into());
        }

        trace!("Wrote {} bytes to {}", data.len(), target.display());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.folder.display().to_string()
    }
}

/// Files in memory
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all stored files, sorted
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Storage for MemoryStorage {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.lock().get(name).cloned())
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.files.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(storage: &dyn Storage, name: &str) -> Result<Option<T>> {
    match storage.read(name)? {
        Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
        None => Ok(None),
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    name: &str,
    value: &T,
    pretty: bool,
) -> Result<()> {
    let data = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    storage.write(name, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_directory_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = DirectoryStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read("a.def").unwrap(), None);
        storage.write("a.def", b"[1]").unwrap();
        assert_eq!(storage.read("a.def").unwrap(), Some(b"[1]".to_vec()));
        assert!(!dir.path().join("nested").join("a.def.tmp").exists());

        storage.write("a.def", b"[2]").unwrap();
        assert_eq!(storage.read("a.def").unwrap(), Some(b"[2]".to_vec()));

        storage.remove("a.def").unwrap();
        storage.remove("a.def").unwrap();
        assert!(!storage.exists("a.def").unwrap());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let storage = DirectoryStorage::new(dir.path()).with_sync(false);

        // a non-empty directory cannot be replaced by a file
        fs::create_dir(dir.path().join("t.def")).unwrap();
        fs::write(dir.path().join("t.def").join("keep"), b"x").unwrap();

        assert!(storage.write("t.def", b"[]").is_err());
        assert!(!dir.path().join("t.def.tmp").exists());
        assert!(dir.path().join("t.def").join("keep").exists());
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.write("b", b"x").unwrap();
        storage.write("a", b"y").unwrap();
        assert_eq!(storage.file_names(), vec!["a".to_string(), "b".to_string()]);
        storage.remove("a").unwrap();
        assert!(!storage.exists("a").unwrap());
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        write_json(&storage, "v.seq", &json!({"value": 3}), false).unwrap();
        let value: Option<serde_json::Value> = read_json(&storage, "v.seq").unwrap();
        assert_eq!(value, Some(json!({"value": 3})));

        storage.write("bad", b"{not json").unwrap();
        let result: Result<Option<serde_json::Value>> = read_json(&storage, "bad");
        assert!(matches!(result, Err(crate::Error::Corruption(_))));
    }
}
