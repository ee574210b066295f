/// Test utilities and helpers for dxdb testing
///
/// [`TestDatabase`] owns a temporary folder so a test can close and reopen
/// the same database. [`FailingStorage`] keeps files in memory and fails
/// the writes a test asks it to.

use dxdb_api::Database;
use dxdb_core::{ColumnSpec, DatabaseConfig, Error, FileSystemDatabase, MemoryStorage, Result, Storage};
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper that manages temporary directory lifecycle
pub struct TestDatabase {
    pub db: Database,
    pub name: String,
    pub path: PathBuf,
    _temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// A database named `test` in a fresh temporary directory
    pub fn new() -> Self {
        Self::named("test")
    }

    pub fn named(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().to_path_buf();
        let db = Database::new(name, Some(&path)).expect("Failed to create database");

        Self {
            db,
            name: name.to_string(),
            path,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Close and load the database again from its files
    pub fn reopen(self) -> Self {
        self.db.close();
        let db = Database::new(&self.name, Some(&self.path)).expect("Failed to reopen database");

        Self {
            db,
            name: self.name,
            path: self.path,
            _temp_dir: self._temp_dir,
        }
    }

    /// Names of the files currently in the database folder
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.path)
            .expect("Failed to list database folder")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// The `cars` table used throughout the suites: `brand STRING(64), sedan BOOLEAN`
pub fn cars_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("brand", "STRING").with_length(64),
        ColumnSpec::new("sedan", "BOOLEAN"),
    ]
}

/// In-memory storage that fails writes to chosen files
///
/// A write fails when the file name ends with one of the armed suffixes.
#[derive(Default)]
pub struct FailingStorage {
    files: MemoryStorage,
    failing: Mutex<Vec<String>>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later write to a file whose name ends with `suffix`
    pub fn fail_writes_to(&self, suffix: &str) {
        self.failing.lock().push(suffix.to_string());
    }

    /// Let every write succeed again
    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.file_names()
    }
}

impl Storage for FailingStorage {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.files.read(name)
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        if self.failing.lock().iter().any(|suffix| name.ends_with(suffix.as_str())) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("injected write failure for {}", name),
            )));
        }
        self.files.write(name, data)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.files.remove(name)
    }

    fn location(&self) -> String {
        "failing-memory".to_string()
    }
}

/// An initialized engine on top of a [`FailingStorage`]
pub fn failing_database(name: &str) -> (Arc<FailingStorage>, FileSystemDatabase) {
    let storage = Arc::new(FailingStorage::new());
    let db = FileSystemDatabase::with_storage(name, storage.clone(), DatabaseConfig::default())
        .expect("Failed to create database");
    db.create().expect("Failed to write root file");
    db.init().expect("Failed to init database");
    (storage, db)
}
