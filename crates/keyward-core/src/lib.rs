//! # keyward-core
//!
//! Envelope encryption with a managed data key:
//! - AES-256-CBC payload encryption behind a swappable cipher trait
//! - Data key wrapped by an X25519 key pair held in the OS keychain
//! - Wrapped key persisted to a record file and cached with a sliding TTL
//! - Salted SHA-512 password hashing
//! - Zeroize-on-drop containers for every secret

pub mod cache;
pub mod crypto;
pub mod error;
pub mod key_store;
pub mod keys;
pub mod settings;
pub mod storage;

pub use cache::{
    typed_key, Cache, MemoryCache, DEFAULT_SLIDING_EXPIRATION, MAX_SLIDING_EXPIRATION,
};
pub use crypto::{
    AesCbcCipher, CipherEnvelope, InertCipher, PasswordHasher, PasswordRecord, SensitiveBuffer,
    SymmetricCipher,
};
pub use error::{KeywardError, Result};
pub use key_store::KeyStore;
pub use keys::{
    DataProtectionKey, KeychainKeyProvider, MemoryKeyProvider, WrappingKeyPair,
    WrappingKeyProvider, X25519KeyPair,
};
pub use settings::{PasswordSettings, Settings, SettingsManager};
pub use storage::{FileKeyRecordStorage, KeyRecordStorage, MemoryKeyRecordStorage, WrappedKeyRecord};
