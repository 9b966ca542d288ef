//! What each report kind is currently showing, and how to tell stale work apart.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Monotonic counter bumped on every `select`/`refresh` of a kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
  pub fn value(self) -> u64 {
    self.0
  }

  fn next(self) -> Self {
    Generation(self.0 + 1)
  }
}

impl From<u64> for Generation {
  fn from(value: u64) -> Self {
    Generation(value)
  }
}

impl fmt::Display for Generation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "g{}", self.0)
  }
}

/// Source of truth for the active selection of one report kind.
///
/// Besides the kind-wide generation it remembers, per key, the generation
/// that started the last fetch whose result was settled for that key. The
/// first answers "is this what the user is looking at right now", the second
/// "would this result move the key backwards".
#[derive(Debug)]
pub struct SelectionContext<K> {
  generation: Generation,
  active: Option<K>,
  settled: HashMap<K, Generation>,
}

impl<K> Default for SelectionContext<K> {
  fn default() -> Self {
    Self {
      generation: Generation::default(),
      active: None,
      settled: HashMap::new(),
    }
  }
}

impl<K: Eq + Hash + Clone> SelectionContext<K> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make `key` the active selection. Always bumps the generation, even when
  /// `key` is already active.
  pub fn set_active(&mut self, key: K) -> Generation {
    self.generation = self.generation.next();
    self.active = Some(key);
    self.generation
  }

  pub fn current_generation(&self) -> Generation {
    self.generation
  }

  pub fn active(&self) -> Option<&K> {
    self.active.as_ref()
  }

  pub fn is_active(&self, key: &K) -> bool {
    self.active.as_ref() == Some(key)
  }

  /// True if `key` is still selected and nothing was selected since `generation`.
  pub fn is_current(&self, key: &K, generation: Generation) -> bool {
    self.generation == generation && self.is_active(key)
  }

  /// True if a fetch started at `origin` is newer than every result already
  /// settled for `key`.
  pub fn is_latest_for(&self, key: &K, origin: Generation) -> bool {
    self
      .settled
      .get(key)
      .map_or(true, |last| *last < origin)
  }

  /// Record that the fetch started at `origin` settled `key`.
  pub fn settle(&mut self, key: K, origin: Generation) {
    let last = self.settled.entry(key).or_default();
    if *last < origin {
      *last = origin;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_active_always_bumps() {
    let mut ctx = SelectionContext::new();
    let g1 = ctx.set_active("w1");
    let g2 = ctx.set_active("w1");
    assert!(g2 > g1);
    assert_eq!(ctx.current_generation(), g2);
    assert!(!ctx.is_current(&"w1", g1));
    assert!(ctx.is_current(&"w1", g2));
  }

  #[test]
  fn test_switching_keys_supersedes_previous() {
    let mut ctx = SelectionContext::new();
    let g1 = ctx.set_active("w1");
    let g2 = ctx.set_active("w2");

    assert_eq!(ctx.active(), Some(&"w2"));
    assert!(!ctx.is_active(&"w1"));
    assert!(!ctx.is_current(&"w1", g1));
    assert!(ctx.is_current(&"w2", g2));
    // w1's fetch is no longer current, but nothing newer settled w1
    assert!(ctx.is_latest_for(&"w1", g1));
  }

  #[test]
  fn test_settled_result_blocks_older_and_repeated_fetches() {
    let mut ctx = SelectionContext::new();
    let g1 = ctx.set_active("w1");
    let g2 = ctx.set_active("w1");
    ctx.settle("w1", g2);

    assert!(!ctx.is_latest_for(&"w1", g1));
    // A second caller joined on the same fetch does not settle twice
    assert!(!ctx.is_latest_for(&"w1", g2));
    let g3 = ctx.set_active("w1");
    assert!(ctx.is_latest_for(&"w1", g3));
  }

  #[test]
  fn test_settle_never_goes_backwards() {
    let mut ctx = SelectionContext::new();
    let g1 = ctx.set_active("w1");
    let g2 = ctx.set_active("w1");
    ctx.settle("w1", g2);
    ctx.settle("w1", g1);
    assert!(!ctx.is_latest_for(&"w1", g2));
  }

  #[test]
  fn test_unknown_key_is_latest_but_not_current() {
    let ctx: SelectionContext<&str> = SelectionContext::new();
    assert!(ctx.is_latest_for(&"never", Generation::default()));
    assert!(!ctx.is_current(&"never", Generation::default()));
    assert_eq!(format!("{}", ctx.current_generation()), "g0");
  }
}
