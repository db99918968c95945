//! Data keys and the asymmetric keys that protect them at rest

mod data_key;
mod provider;
mod wrapping;

pub use data_key::{DataProtectionKey, DATA_KEY_SIZE};
pub use provider::{require_key_pair, KeychainKeyProvider, MemoryKeyProvider, WrappingKeyProvider};
pub use wrapping::{normalize_identifier, WrappingKeyPair, X25519KeyPair, X25519_KEY_SIZE};
