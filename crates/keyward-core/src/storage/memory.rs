//! In-process record storage, for tests and demos

use std::sync::Mutex;

use super::KeyRecordStorage;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryKeyRecordStorage {
    contents: Mutex<Option<String>>,
}

impl MemoryKeyRecordStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Mutex::new(Some(contents.to_string())),
        }
    }
}

impl KeyRecordStorage for MemoryKeyRecordStorage {
    fn read(&self) -> Result<Option<String>> {
        Ok(self
            .contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Record Storage"
    }
}
