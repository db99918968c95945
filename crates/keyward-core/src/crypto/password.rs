//! Salted SHA-512 password hashing
//!
//! The hash is `lowercase_hex(SHA-512(utf8(password) || salt))`. A record
//! keeps the hash and the salt together so the hash can be recomputed later
//! for verification.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use super::random::{check_salt_bounds, random_salt};
use super::secure_memory::constant_time_eq;
use crate::error::{KeywardError, Result};
use crate::settings::PasswordSettings;

/// Default lower bound for generated salt length in bytes
pub const DEFAULT_MIN_SALT_BYTES: usize = 48;

/// Default upper bound (inclusive) for generated salt length in bytes
pub const DEFAULT_MAX_SALT_BYTES: usize = 64;

/// Immutable (hash, salt) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRecord {
    hash: String,
    #[serde(with = "hex::serde")]
    salt: Vec<u8>,
}

impl PasswordRecord {
    /// Hash a password under a new salt of 48 to 64 bytes
    pub fn create(password: &str) -> Result<Self> {
        Self::create_with_salt_range(password, DEFAULT_MIN_SALT_BYTES, DEFAULT_MAX_SALT_BYTES)
    }

    /// Hash a password under a new salt whose length lies in `min..=max`
    pub fn create_with_salt_range(
        password: &str,
        min_salt_bytes: usize,
        max_salt_bytes: usize,
    ) -> Result<Self> {
        ensure_password(password)?;
        let salt = random_salt(min_salt_bytes, max_salt_bytes)?;
        Self::create_with_salt(password, &salt)
    }

    /// Hash a password under a caller-supplied salt. Deterministic.
    pub fn create_with_salt(password: &str, salt: &[u8]) -> Result<Self> {
        ensure_password(password)?;
        if salt.is_empty() {
            return Err(KeywardError::invalid("salt", "must not be empty"));
        }
        Ok(Self {
            hash: hash_with_salt(password, salt),
            salt: salt.to_vec(),
        })
    }

    /// Lowercase hex SHA-512 digest
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Recompute the hash of `password` with the stored salt and compare
    pub fn verify(&self, password: &str) -> bool {
        if password.is_empty() {
            return false;
        }
        let candidate = hash_with_salt(password, &self.salt);
        constant_time_eq(candidate.as_bytes(), self.hash.as_bytes())
    }
}

/// Password hasher with configured salt bounds
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    min_salt_bytes: usize,
    max_salt_bytes: usize,
}

impl PasswordHasher {
    /// Create a hasher; bounds must be non-zero and `min <= max`
    pub fn new(min_salt_bytes: usize, max_salt_bytes: usize) -> Result<Self> {
        check_salt_bounds(min_salt_bytes, max_salt_bytes)?;
        Ok(Self {
            min_salt_bytes,
            max_salt_bytes,
        })
    }

    pub fn from_settings(settings: &PasswordSettings) -> Result<Self> {
        Self::new(settings.min_salt_bytes, settings.max_salt_bytes)
    }

    pub fn create(&self, password: &str) -> Result<PasswordRecord> {
        PasswordRecord::create_with_salt_range(password, self.min_salt_bytes, self.max_salt_bytes)
    }

    pub fn create_with_salt(&self, password: &str, salt: &[u8]) -> Result<PasswordRecord> {
        PasswordRecord::create_with_salt(password, salt)
    }

    pub fn salt_bounds(&self) -> (usize, usize) {
        (self.min_salt_bytes, self.max_salt_bytes)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            min_salt_bytes: DEFAULT_MIN_SALT_BYTES,
            max_salt_bytes: DEFAULT_MAX_SALT_BYTES,
        }
    }
}

fn ensure_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(KeywardError::invalid("password", "must not be empty"));
    }
    Ok(())
}

fn hash_with_salt(password: &str, salt: &[u8]) -> String {
    let mut salted = Zeroizing::new(Vec::with_capacity(password.len() + salt.len()));
    salted.extend_from_slice(password.as_bytes());
    salted.extend_from_slice(salt);
    hex::encode(Sha512::digest(salted.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_bounds() {
        let record = PasswordRecord::create("secret").unwrap();

        assert!((48..=64).contains(&record.salt().len()));
        assert_eq!(record.hash().len(), 128);
        assert!(record
            .hash()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_same_salt_reproduces_hash() {
        let record = PasswordRecord::create("secret").unwrap();
        let again = PasswordRecord::create_with_salt("secret", record.salt()).unwrap();
        assert_eq!(record.hash(), again.hash());
    }

    #[test]
    fn test_other_password_differs() {
        let record = PasswordRecord::create("secret").unwrap();
        let other = PasswordRecord::create_with_salt("other", record.salt()).unwrap();
        assert_ne!(record.hash(), other.hash());
    }

    #[test]
    fn test_known_digest() {
        // sha512("abc") with the salt supplying the final two bytes
        let record = PasswordRecord::create_with_salt("a", b"bc").unwrap();
        assert_eq!(
            record.hash(),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_verify() {
        let record = PasswordRecord::create("correct horse").unwrap();
        assert!(record.verify("correct horse"));
        assert!(!record.verify("battery staple"));
        assert!(!record.verify(""));
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(matches!(
            PasswordRecord::create(""),
            Err(KeywardError::InvalidArgument(_))
        ));
        assert!(matches!(
            PasswordRecord::create_with_salt("", b"salt"),
            Err(KeywardError::InvalidArgument(_))
        ));
        assert!(matches!(
            PasswordRecord::create_with_salt("secret", &[]),
            Err(KeywardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_bad_salt_bounds() {
        assert!(PasswordRecord::create_with_salt_range("secret", 0, 64).is_err());
        assert!(PasswordRecord::create_with_salt_range("secret", 48, 0).is_err());
        assert!(PasswordRecord::create_with_salt_range("secret", 65, 64).is_err());
        assert!(PasswordHasher::new(10, 5).is_err());
        assert!(matches!(
            PasswordHasher::new(usize::MAX, usize::MAX),
            Err(KeywardError::OutOfRange(_))
        ));
        assert!(matches!(
            PasswordRecord::create_with_salt_range("secret", 48, usize::MAX),
            Err(KeywardError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_hasher_uses_configured_bounds() {
        let hasher = PasswordHasher::new(8, 8).unwrap();
        let record = hasher.create("secret").unwrap();
        assert_eq!(record.salt().len(), 8);
        assert_eq!(hasher.salt_bounds(), (8, 8));
        assert_eq!(PasswordHasher::default().salt_bounds(), (48, 64));
    }

    #[test]
    fn test_record_serialization() {
        let record = PasswordRecord::create_with_salt("secret", &[0xde, 0xad]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"salt\":\"dead\""));

        let parsed: PasswordRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(parsed.verify("secret"));
    }
}
