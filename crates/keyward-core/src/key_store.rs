//! Data key lifecycle
//!
//! `KeyStore` hands out the data-protection key and keeps it safe at rest:
//!
//! 1. **Cache hit**: the cache holds the wrapped key. A copy is unwrapped
//!    with the private half of the wrapping key pair and returned. Storage is
//!    not touched.
//! 2. **Cache miss, record on disk**: the wrapped record is read, checked,
//!    cached, then handled as a hit.
//! 3. **Cache miss, no record**: a fresh key is generated, saved, and
//!    returned.
//!
//! The cache and the record only ever see the wrapped form. The whole
//! sequence runs under a lock owned by the store, so concurrent first callers
//! agree on a single key.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{typed_key, Cache, MAX_SLIDING_EXPIRATION};
use crate::error::{KeywardError, Result};
use crate::keys::{
    normalize_identifier, require_key_pair, DataProtectionKey, WrappingKeyPair,
    WrappingKeyProvider, DATA_KEY_SIZE,
};
use crate::settings::Settings;
use crate::storage::{FileKeyRecordStorage, KeyRecordStorage, WrappedKeyRecord};

/// Manages the wrapped data key across cache and persistent storage
pub struct KeyStore {
    identifier: String,
    cache_key: String,
    wrapping_key: Arc<dyn WrappingKeyPair>,
    storage: Arc<dyn KeyRecordStorage>,
    cache: Arc<dyn Cache<DataProtectionKey>>,
    cache_ttl: Duration,
    load_lock: Mutex<()>,
}

impl KeyStore {
    /// Create a store for the wrapping key named by `identifier`
    ///
    /// Fails with `Configuration` when the provider has no such key pair.
    pub fn new(
        provider: &dyn WrappingKeyProvider,
        identifier: &str,
        storage: Arc<dyn KeyRecordStorage>,
        cache: Arc<dyn Cache<DataProtectionKey>>,
        cache_ttl: Duration,
    ) -> Result<Self> {
        if cache_ttl.is_zero() {
            return Err(KeywardError::out_of_range(
                "cache_ttl",
                "must be greater than zero",
            ));
        }
        if cache_ttl > MAX_SLIDING_EXPIRATION {
            return Err(KeywardError::out_of_range(
                "cache_ttl",
                "must not exceed one year",
            ));
        }

        let wrapping_key = require_key_pair(provider, identifier)?;
        let identifier = normalize_identifier(identifier);

        info!(
            "Key store ready: wrapping key {} from {}, records in {}, cache {}",
            identifier,
            provider.backend_name(),
            storage.backend_name(),
            cache.backend_name()
        );

        Ok(Self {
            identifier,
            cache_key: typed_key::<DataProtectionKey>("key")?,
            wrapping_key,
            storage,
            cache,
            cache_ttl,
            load_lock: Mutex::new(()),
        })
    }

    /// Build a file-backed store from settings
    pub fn from_settings(
        settings: &Settings,
        provider: &dyn WrappingKeyProvider,
        cache: Arc<dyn Cache<DataProtectionKey>>,
    ) -> Result<Self> {
        settings.validate()?;

        let storage = FileKeyRecordStorage::with_dir(
            settings.resolve_key_directory()?,
            &settings.wrapping_key_id,
        )?;

        Self::new(
            provider,
            &settings.wrapping_key_id,
            Arc::new(storage),
            cache,
            settings.cache_ttl(),
        )
    }

    /// Normalized identifier of the wrapping key
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Cache key under which the wrapped data key is kept
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Get the unwrapped data key, creating and persisting one on first use
    ///
    /// The returned key is the caller's own copy.
    pub fn get_key(&self) -> Result<DataProtectionKey> {
        let _guard = self.load_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(wrapped) = self.cache.try_get(&self.cache_key)? {
            debug!("Data key cache hit");
            return self.unwrap_data_key(&wrapped);
        }

        debug!("Data key cache miss");

        match self.storage.read()? {
            Some(contents) => {
                let wrapped =
                    WrappedKeyRecord::parse(&contents, &self.identifier)?.into_wrapped_key()?;
                let key = self.unwrap_data_key(&wrapped)?;

                self.cache
                    .add_sliding(&self.cache_key, wrapped, self.cache_ttl)?;
                debug!("Loaded data key from {}", self.storage.backend_name());
                Ok(key)
            }
            None => {
                info!("No data key found, generating a new one");
                let key = DataProtectionKey::create(&self.identifier)?;
                self.save_locked(&key)?;
                Ok(key)
            }
        }
    }

    /// Wrap and persist `key`, replacing the cached copy
    ///
    /// `key` itself is left unwrapped and usable.
    pub fn save(&self, key: &DataProtectionKey) -> Result<()> {
        let _guard = self.load_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.save_locked(key)
    }

    fn save_locked(&self, key: &DataProtectionKey) -> Result<()> {
        if key.is_released() {
            return Err(KeywardError::invalid("key", "has been released"));
        }
        if key.len() != DATA_KEY_SIZE {
            return Err(KeywardError::InvalidArgument(format!(
                "key: expected {} bytes, got {}",
                DATA_KEY_SIZE,
                key.len()
            )));
        }
        if normalize_identifier(key.identifier()) != self.identifier {
            return Err(KeywardError::InvalidArgument(format!(
                "key: bound to wrapping key '{}', store uses '{}'",
                key.identifier(),
                self.identifier
            )));
        }

        let wrapped = DataProtectionKey::new(
            self.wrapping_key.wrap_key(key.as_bytes())?,
            &self.identifier,
        )?;

        let record = WrappedKeyRecord::from_wrapped(&wrapped);
        self.storage.write(&record.to_json()?)?;

        self.cache.remove(&self.cache_key)?;
        self.cache
            .add_sliding(&self.cache_key, wrapped, self.cache_ttl)?;

        info!("Saved data key wrapped by {}", self.identifier);
        Ok(())
    }

    fn unwrap_data_key(&self, wrapped: &DataProtectionKey) -> Result<DataProtectionKey> {
        if normalize_identifier(wrapped.identifier()) != self.identifier {
            return Err(KeywardError::DataCorruption(format!(
                "Cached key belongs to wrapping key '{}'",
                wrapped.identifier()
            )));
        }

        let raw = self
            .wrapping_key
            .unwrap_key(wrapped.as_bytes())
            .map_err(|e| match e {
                KeywardError::DecryptionError(reason) => KeywardError::DataCorruption(format!(
                    "Wrapped key could not be unwrapped: {}",
                    reason
                )),
                other => other,
            })?;

        if raw.len() != DATA_KEY_SIZE {
            return Err(KeywardError::DataCorruption(format!(
                "Unwrapped key has {} bytes, expected {}",
                raw.len(),
                DATA_KEY_SIZE
            )));
        }

        DataProtectionKey::new(raw.to_vec(), &self.identifier)
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("identifier", &self.identifier)
            .field("storage", &self.storage.backend_name())
            .field("cache", &self.cache.backend_name())
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}
