//! The data-protection key entity
//!
//! A `DataProtectionKey` carries either raw AES-256 key material or the same
//! material wrapped by an asymmetric key, together with the identifier of that
//! wrapping key. Which form it holds depends on where it came from: the
//! `KeyStore` hands out raw keys and keeps wrapped ones.

use std::hash::{Hash, Hasher};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time_eq, random_bytes};
use crate::error::{KeywardError, Result};

/// Size of raw AES-256 key material in bytes
pub const DATA_KEY_SIZE: usize = 32;

/// Symmetric data key bound to the identifier of its wrapping key
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataProtectionKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    identifier: String,
    released: bool,
}

impl DataProtectionKey {
    /// Mint a fresh 32-byte key from the CSPRNG, bound to `identifier`
    pub fn create(identifier: &str) -> Result<Self> {
        Self::new(random_bytes(DATA_KEY_SIZE), identifier)
    }

    /// Bind existing bytes (raw or wrapped) to `identifier`
    pub fn new(key: Vec<u8>, identifier: &str) -> Result<Self> {
        if identifier.trim().is_empty() {
            return Err(KeywardError::invalid("identifier", "must not be empty"));
        }
        if key.is_empty() {
            return Err(KeywardError::invalid("key", "must not be empty"));
        }
        Ok(Self {
            key,
            identifier: identifier.to_string(),
            released: false,
        })
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Identifier of the asymmetric key that protects this key at rest
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Overwrite the key bytes with zeros now, keeping the length
    pub fn release(&mut self) {
        self.key.as_mut_slice().zeroize();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Structural equality: byte-equal keys and case-insensitively equal identifiers
    pub fn content_eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.key, &other.key)
            && self.identifier.eq_ignore_ascii_case(&other.identifier)
    }
}

/// Deep copy: the clone owns its own buffer
impl Clone for DataProtectionKey {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            identifier: self.identifier.clone(),
            released: self.released,
        }
    }
}

impl PartialEq for DataProtectionKey {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for DataProtectionKey {}

impl Hash for DataProtectionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.identifier.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Debug for DataProtectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProtectionKey")
            .field("key", &"[REDACTED]")
            .field("identifier", &self.identifier)
            .finish()
    }
}
