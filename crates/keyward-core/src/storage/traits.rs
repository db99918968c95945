//! Storage trait definitions

use crate::error::Result;

/// Trait for persistence backends holding one wrapped key record
///
/// A backend is bound to a single location derived from the wrapping key
/// identifier. Writes overwrite any prior content.
pub trait KeyRecordStorage: Send + Sync {
    /// Read the serialized record, or `None` if nothing was ever written
    fn read(&self) -> Result<Option<String>>;

    /// Replace the serialized record
    fn write(&self, contents: &str) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
