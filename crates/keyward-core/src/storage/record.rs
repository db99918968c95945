//! On-disk format of a wrapped data key
//!
//! ```json
//! {
//!   "version": 1,
//!   "identifier": "3f0c...",
//!   "wrappedKey": "<base64>",
//!   "createdAt": "2024-01-01T00:00:00Z"
//! }
//! ```

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KeywardError, Result};
use crate::keys::{normalize_identifier, DataProtectionKey};

/// Current record format version
pub const RECORD_VERSION: u32 = 1;

/// Serialized (identifier, wrapped bytes) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedKeyRecord {
    pub version: u32,
    pub identifier: String,
    /// Base64 of the wrapped key bytes
    pub wrapped_key: String,
    pub created_at: DateTime<Utc>,
}

impl WrappedKeyRecord {
    /// Build a record from a key that already holds wrapped bytes
    pub fn from_wrapped(wrapped: &DataProtectionKey) -> Self {
        Self {
            version: RECORD_VERSION,
            identifier: normalize_identifier(wrapped.identifier()),
            wrapped_key: base64::engine::general_purpose::STANDARD.encode(wrapped.as_bytes()),
            created_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a record and check it belongs to `expected_identifier`
    ///
    /// Anything unreadable is `DataCorruption`; a replacement key is never
    /// produced from a bad record.
    pub fn parse(contents: &str, expected_identifier: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Err(corrupt("record is empty"));
        }

        let record: Self = serde_json::from_str(contents)
            .map_err(|e| corrupt(&format!("record is not valid JSON: {}", e)))?;

        if record.version != RECORD_VERSION {
            return Err(corrupt(&format!(
                "unsupported record version {}",
                record.version
            )));
        }

        if normalize_identifier(&record.identifier) != normalize_identifier(expected_identifier) {
            return Err(corrupt(&format!(
                "record belongs to wrapping key '{}', expected '{}'",
                record.identifier, expected_identifier
            )));
        }

        Ok(record)
    }

    /// Decode into a key holding the wrapped bytes
    pub fn into_wrapped_key(self) -> Result<DataProtectionKey> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.wrapped_key.as_bytes())
            .map_err(|e| corrupt(&format!("wrapped key is not valid base64: {}", e)))?;

        if bytes.is_empty() {
            return Err(corrupt("wrapped key is empty"));
        }

        DataProtectionKey::new(bytes, &self.identifier)
    }
}

fn corrupt(reason: &str) -> KeywardError {
    KeywardError::DataCorruption(format!("Wrapped key record: {}", reason))
}
