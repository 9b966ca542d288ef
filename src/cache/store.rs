//! In-memory TTL store, one per report kind.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use super::entry::CacheEntry;

/// Key to value store with a single time-to-live for every entry.
///
/// Nothing is persisted and nothing is evicted on its own; the key space is
/// bounded by what a user can navigate to in one session.
pub struct CacheStore<K, V> {
  entries: RwLock<HashMap<K, CacheEntry<V>>>,
  ttl: Duration,
}

impl<K, V> CacheStore<K, V>
where
  K: Eq + Hash + Clone + std::fmt::Debug,
  V: Clone,
{
  pub fn new(ttl: Duration) -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Get the entry for `key`, fresh or not.
  pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
    self
      .entries
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  /// Get the value for `key` only if it is still fresh at `now`.
  pub fn fresh(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
    self
      .get(key)
      .filter(|entry| self.is_fresh(entry, now))
      .map(|entry| entry.value)
  }

  pub fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
    entry.is_fresh(now, self.ttl)
  }

  /// Store `value` for `key`, stamped with `now`.
  ///
  /// Returns false and leaves the existing entry alone if it was fetched
  /// later than `now`, so `fetched_at` never goes backwards for a key.
  pub fn put(&self, key: K, value: V, now: DateTime<Utc>) -> bool {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = entries.get(&key) {
      if existing.fetched_at > now {
        debug!(?key, "rejecting cache write older than current entry");
        return false;
      }
    }
    entries.insert(key, CacheEntry::new(value, now));
    true
  }

  pub fn invalidate(&self, key: &K) -> Option<CacheEntry<V>> {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key)
  }

  pub fn clear(&self) {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }

  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
