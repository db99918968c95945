//! Cache trait definitions

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{KeywardError, Result};

/// Sliding expiration used by `Cache::add`
pub const DEFAULT_SLIDING_EXPIRATION: Duration = Duration::from_secs(30 * 60);

/// Longest sliding expiration a cache accepts (one year)
pub const MAX_SLIDING_EXPIRATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Trait for cache backends
///
/// Adding under a key that already holds a live entry keeps the existing
/// entry; remove it first to replace it.
pub trait Cache<V>: Send + Sync {
    /// Add an item with the default 30-minute sliding expiration
    fn add(&self, key: &str, item: V) -> Result<()> {
        self.add_sliding(key, item, DEFAULT_SLIDING_EXPIRATION)
    }

    /// Add an item that expires after `duration` without access
    fn add_sliding(&self, key: &str, item: V, duration: Duration) -> Result<()>;

    /// Add an item that expires at a fixed point in time
    fn add_absolute(&self, key: &str, item: V, expires_at: DateTime<Utc>) -> Result<()>;

    /// Remove an item; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Check if a live item exists
    fn exists(&self, key: &str) -> Result<bool>;

    /// Get a copy of a live item
    fn try_get(&self, key: &str) -> Result<Option<V>>;

    /// Get a human-readable name for this cache backend
    fn backend_name(&self) -> &'static str;
}

/// Build a key namespaced by the item type: `"{type}_{key}"`
pub fn typed_key<T: ?Sized>(key: &str) -> Result<String> {
    ensure_key(key)?;
    Ok(format!("{}_{}", std::any::type_name::<T>(), key))
}

pub(crate) fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KeywardError::out_of_range("key", "must not be empty"));
    }
    Ok(())
}

pub(crate) fn ensure_duration(duration: Duration) -> Result<()> {
    if duration.is_zero() {
        return Err(KeywardError::out_of_range("duration", "must be greater than zero"));
    }
    if duration > MAX_SLIDING_EXPIRATION {
        return Err(KeywardError::out_of_range("duration", "must not exceed one year"));
    }
    Ok(())
}

pub(crate) fn ensure_future(expires_at: DateTime<Utc>) -> Result<()> {
    if expires_at <= Utc::now() {
        return Err(KeywardError::out_of_range("expires_at", "must be in the future"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_key() {
        assert_eq!(typed_key::<u32>("count").unwrap(), "u32_count");
        assert!(typed_key::<String>("name").unwrap().ends_with("String_name"));
        assert!(matches!(typed_key::<u32>(""), Err(KeywardError::OutOfRange(_))));
    }

    #[test]
    fn test_argument_guards() {
        assert!(ensure_duration(Duration::ZERO).is_err());
        assert!(ensure_duration(Duration::from_millis(1)).is_ok());
        assert!(ensure_duration(MAX_SLIDING_EXPIRATION).is_ok());
        assert!(matches!(
            ensure_duration(MAX_SLIDING_EXPIRATION + Duration::from_secs(1)),
            Err(KeywardError::OutOfRange(_))
        ));
        assert!(ensure_future(Utc::now() - chrono::Duration::seconds(1)).is_err());
        assert!(ensure_future(Utc::now() + chrono::Duration::seconds(60)).is_ok());
    }
}
