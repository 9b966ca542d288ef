//! In-memory caching for insight reports.
//!
//! This module provides:
//! - A TTL store per report kind (no persistence, no eviction)
//! - Freshness checks against an injectable clock
//! - Monotonic `fetched_at` per key, so late writes never regress an entry

mod clock;
mod entry;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use store::CacheStore;
