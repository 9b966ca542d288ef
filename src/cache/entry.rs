//! Cached values and their freshness.

use chrono::{DateTime, Duration, Utc};

/// A report value together with the moment it was fetched.
///
/// Entries are replaced wholesale by newer fetches and never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
  pub value: T,
  pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
  pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
    Self { value, fetched_at }
  }

  /// Fresh while strictly younger than `ttl`.
  pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - self.fetched_at < ttl
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
  }

  #[test]
  fn test_fresh_just_before_ttl() {
    let entry = CacheEntry::new("x", at(0));
    let ttl = Duration::minutes(5);
    assert!(entry.is_fresh(at(299), ttl));
  }

  #[test]
  fn test_stale_at_and_after_ttl() {
    let entry = CacheEntry::new("x", at(0));
    let ttl = Duration::minutes(5);
    assert!(!entry.is_fresh(at(300), ttl));
    assert!(!entry.is_fresh(at(301), ttl));
  }
}
