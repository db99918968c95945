//! Wrapping key lookup
//!
//! A provider resolves an identifier to a key pair that holds its private
//! half. Two backends:
//! 1. OS keychain (`KeychainKeyProvider`)
//! 2. In-process registry (`MemoryKeyProvider`)

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::Engine;
use keyring::Entry;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::wrapping::{normalize_identifier, WrappingKeyPair, X25519KeyPair};
use crate::error::{KeywardError, Result};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "keyward";

/// Trait for platform key stores that hold wrapping key pairs
pub trait WrappingKeyProvider: Send + Sync {
    /// Find the key pair for an identifier (spaces and case are ignored)
    fn lookup(&self, identifier: &str) -> Result<Option<Arc<dyn WrappingKeyPair>>>;

    /// Get a human-readable name for this provider
    fn backend_name(&self) -> &'static str;
}

/// Look up a key pair that must exist; absence is a configuration error
pub fn require_key_pair(
    provider: &dyn WrappingKeyProvider,
    identifier: &str,
) -> Result<Arc<dyn WrappingKeyPair>> {
    if normalize_identifier(identifier).is_empty() {
        return Err(KeywardError::invalid("identifier", "must not be empty"));
    }
    provider.lookup(identifier)?.ok_or_else(|| {
        KeywardError::Configuration(format!(
            "No wrapping key pair with identifier '{}' in {}",
            identifier,
            provider.backend_name()
        ))
    })
}

/// In-process key pair registry
#[derive(Default)]
pub struct MemoryKeyProvider {
    pairs: RwLock<HashMap<String, Arc<X25519KeyPair>>>,
}

impl MemoryKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key pair under its own identifier
    pub fn insert(&self, pair: X25519KeyPair) -> String {
        let identifier = pair.identifier().to_string();
        self.pairs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identifier.clone(), Arc::new(pair));
        identifier
    }

    /// Generate and register a fresh key pair, returning its identifier
    pub fn generate(&self) -> String {
        self.insert(X25519KeyPair::generate())
    }

    pub fn remove(&self, identifier: &str) -> bool {
        self.pairs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&normalize_identifier(identifier))
            .is_some()
    }
}

impl WrappingKeyProvider for MemoryKeyProvider {
    fn lookup(&self, identifier: &str) -> Result<Option<Arc<dyn WrappingKeyPair>>> {
        let pairs = self.pairs.read().unwrap_or_else(|e| e.into_inner());
        Ok(pairs
            .get(&normalize_identifier(identifier))
            .map(|pair| pair.clone() as Arc<dyn WrappingKeyPair>))
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Key Provider"
    }
}

/// OS keychain key provider
///
/// Uses the system keychain for private keys:
/// - macOS: Keychain
/// - Windows: Credential Manager (DPAPI)
/// - Linux: Secret Service (GNOME Keyring, KWallet)
pub struct KeychainKeyProvider {
    /// Prefix for all entries (for namespacing)
    prefix: String,
    /// Whether keychain is available
    available: bool,
}

impl KeychainKeyProvider {
    /// Create a new keychain provider with optional prefix
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix.map(|p| format!("{}-", p)).unwrap_or_default();

        let available = Self::test_availability();

        if available {
            debug!("Keychain key provider is available");
        } else {
            warn!("Keychain key provider is not available");
        }

        Self { prefix, available }
    }

    /// Test if the keychain is available
    fn test_availability() -> bool {
        match Entry::new(SERVICE_NAME, "__test_availability__") {
            Ok(entry) => {
                if entry.set_password("test").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Check if keychain is available
    pub fn is_available(&self) -> bool {
        self.available
    }

    fn ensure_available(&self) -> Result<()> {
        if !self.available {
            return Err(KeywardError::KeychainError(
                "Keychain not available".to_string(),
            ));
        }
        Ok(())
    }

    fn get_entry(&self, identifier: &str) -> Result<Entry> {
        let account = format!("{}{}", self.prefix, normalize_identifier(identifier));
        Entry::new(SERVICE_NAME, &account).map_err(|e| KeywardError::KeychainError(e.to_string()))
    }

    /// Store a key pair's private half, returning its identifier
    pub fn import(&self, pair: &X25519KeyPair) -> Result<String> {
        self.ensure_available()?;

        let entry = self.get_entry(pair.identifier())?;
        let encoded = Zeroizing::new(
            base64::engine::general_purpose::STANDARD.encode(&pair.secret_bytes()[..]),
        );
        entry
            .set_password(&encoded)
            .map_err(|e| KeywardError::KeychainError(e.to_string()))?;

        debug!("Imported wrapping key into keychain: {}", pair.identifier());
        Ok(pair.identifier().to_string())
    }

    /// Delete a key pair; missing entries are not an error
    pub fn remove(&self, identifier: &str) -> Result<()> {
        self.ensure_available()?;

        match self.get_entry(identifier)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeywardError::KeychainError(e.to_string())),
        }
    }
}

impl WrappingKeyProvider for KeychainKeyProvider {
    fn lookup(&self, identifier: &str) -> Result<Option<Arc<dyn WrappingKeyPair>>> {
        self.ensure_available()?;

        let encoded = match self.get_entry(identifier)?.get_password() {
            Ok(encoded) => Zeroizing::new(encoded),
            Err(keyring::Error::NoEntry) => {
                debug!("Wrapping key not found in keychain: {}", identifier);
                return Ok(None);
            }
            Err(e) => return Err(KeywardError::KeychainError(e.to_string())),
        };

        let secret = Zeroizing::new(
            base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| KeywardError::KeychainError(format!("Base64 decode error: {}", e)))?,
        );
        let pair = X25519KeyPair::from_slice(&secret)?;

        if pair.identifier() != normalize_identifier(identifier) {
            warn!("Keychain entry {} holds a different key pair", identifier);
            return Err(KeywardError::Configuration(format!(
                "Keychain entry '{}' does not match its key pair",
                identifier
            )));
        }

        Ok(Some(Arc::new(pair)))
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}
