//! File record storage backend
//!
//! Stores the wrapped key record as `<dir>/<identifier>.json` in the user's
//! data directory. Writes go to a temp file first and are renamed into place.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use super::KeyRecordStorage;
use crate::error::{KeywardError, Result};
use crate::keys::normalize_identifier;

/// Get the default directory for wrapped key records
pub fn default_key_directory() -> Result<PathBuf> {
    ProjectDirs::from("com", "keyward", "keyward")
        .map(|dirs| dirs.data_dir().join("keys"))
        .ok_or_else(|| KeywardError::StorageError("Could not determine data directory".to_string()))
}

/// File record storage backend
#[derive(Debug)]
pub struct FileKeyRecordStorage {
    record_path: PathBuf,
}

impl FileKeyRecordStorage {
    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: impl AsRef<Path>, identifier: &str) -> Result<Self> {
        let identifier = normalize_identifier(identifier);
        if identifier.is_empty() {
            return Err(KeywardError::invalid("identifier", "must not be empty"));
        }

        let storage_dir = storage_dir.as_ref();
        std::fs::create_dir_all(storage_dir)?;

        let record_path = storage_dir.join(format!("{}.json", identifier));
        debug!("Key record storage initialized at: {:?}", record_path);

        Ok(Self { record_path })
    }

    /// Get the path to the record file
    pub fn path(&self) -> &Path {
        &self.record_path
    }
}

impl KeyRecordStorage for FileKeyRecordStorage {
    fn read(&self) -> Result<Option<String>> {
        if !self.record_path.exists() {
            debug!("No existing key record found");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.record_path)?;
        debug!("Loaded key record from {:?}", self.record_path);
        Ok(Some(contents))
    }

    fn write(&self, contents: &str) -> Result<()> {
        // Write atomically using a temp file
        let temp_path = self.record_path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.record_path)?;

        debug!("Saved key record to {:?}", self.record_path);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Key Record File"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileKeyRecordStorage::with_dir(temp_dir.path(), "AB CD").unwrap();

        assert_eq!(storage.path(), temp_dir.path().join("abcd.json"));
        assert_eq!(storage.read().unwrap(), None);

        storage.write("{\"a\":1}").unwrap();
        storage.write("{\"a\":2}").unwrap();
        assert_eq!(storage.read().unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(!storage.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let storage = FileKeyRecordStorage::with_dir(&nested, "abcd").unwrap();

        storage.write("x").unwrap();
        assert!(nested.join("abcd.json").exists());
    }

    #[test]
    fn test_same_identifier_same_file() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileKeyRecordStorage::with_dir(temp_dir.path(), "ABCD").unwrap();
        let second = FileKeyRecordStorage::with_dir(temp_dir.path(), "ab cd").unwrap();

        first.write("shared").unwrap();
        assert_eq!(second.read().unwrap().as_deref(), Some("shared"));
    }

    #[test]
    fn test_rejects_empty_identifier() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            FileKeyRecordStorage::with_dir(temp_dir.path(), " "),
            Err(KeywardError::InvalidArgument(_))
        ));
    }
}
