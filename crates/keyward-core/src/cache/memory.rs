//! In-process cache backend
//!
//! Expiration is lazy: an entry is checked, and dropped if stale, when it is
//! next touched. `purge_expired` sweeps everything on demand.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::traits::{ensure_duration, ensure_future, ensure_key, Cache};
use crate::error::{KeywardError, Result};

#[derive(Debug, Clone, Copy)]
enum Expiration {
    Sliding { window: Duration, deadline: Instant },
    Absolute(DateTime<Utc>),
}

impl Expiration {
    fn sliding(window: Duration) -> Result<Self> {
        let deadline = Instant::now()
            .checked_add(window)
            .ok_or_else(|| KeywardError::out_of_range("duration", "deadline overflows the clock"))?;
        Ok(Expiration::Sliding { window, deadline })
    }

    fn is_expired(&self) -> bool {
        match self {
            Expiration::Sliding { deadline, .. } => Instant::now() >= *deadline,
            Expiration::Absolute(at) => Utc::now() >= *at,
        }
    }

    fn touch(&mut self) {
        if let Expiration::Sliding { window, deadline } = self {
            if let Some(next) = Instant::now().checked_add(*window) {
                *deadline = next;
            }
        }
    }
}

struct CacheEntry<V> {
    item: V,
    expiration: Expiration,
}

/// In-memory cache shared through an `Arc`
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, key: &str, item: V, expiration: Expiration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = entries.get(key) {
            if !existing.expiration.is_expired() {
                debug!("Cache entry already present, keeping it: {}", key);
                return;
            }
        }

        entries.insert(key.to_string(), CacheEntry { item, expiration });
        debug!("Cached entry: {}", key);
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.expiration.is_expired());
        before - entries.len()
    }

    /// Number of stored entries, including ones that expired but were not yet touched
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Cache<V> for MemoryCache<V> {
    fn add_sliding(&self, key: &str, item: V, duration: Duration) -> Result<()> {
        ensure_key(key)?;
        ensure_duration(duration)?;
        self.insert(key, item, Expiration::sliding(duration)?);
        Ok(())
    }

    fn add_absolute(&self, key: &str, item: V, expires_at: DateTime<Utc>) -> Result<()> {
        ensure_key(key)?;
        ensure_future(expires_at)?;
        self.insert(key, item, Expiration::Absolute(expires_at));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        ensure_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            debug!("Removed cache entry: {}", key);
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        ensure_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(live_entry(&mut entries, key).is_some())
    }

    fn try_get(&self, key: &str) -> Result<Option<V>> {
        ensure_key(key)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(live_entry(&mut entries, key).map(|entry| entry.item.clone()))
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Cache"
    }
}

/// Get a live entry, refreshing its sliding window; stale entries are dropped
fn live_entry<'a, V>(
    entries: &'a mut HashMap<String, CacheEntry<V>>,
    key: &str,
) -> Option<&'a mut CacheEntry<V>> {
    if entries
        .get(key)
        .is_some_and(|entry| entry.expiration.is_expired())
    {
        entries.remove(key);
        debug!("Cache entry expired: {}", key);
        return None;
    }

    let entry = entries.get_mut(key)?;
    entry.expiration.touch();
    Some(entry)
}
