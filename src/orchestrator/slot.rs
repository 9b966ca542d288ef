//! Process-wide state for one report kind.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStore};
use crate::error::FetchError;
use crate::gate::{FetchGate, Settled};
use crate::insights::Report;
use crate::selection::{Generation, SelectionContext};
use crate::state::{ActiveState, ObservableState};

pub(crate) type ActiveChannel<R> = Option<ActiveState<<R as Report>::Key, R>>;

/// What happened to a finished fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commit {
  /// Written and published; `current` if the active channel saw it too
  Published { current: bool },
  /// The key was already settled by this fetch or a newer one
  Stale,
  /// The requester was disposed or the fetch was cancelled
  Cancelled,
}

/// Cache, gate, selection and state channels for one kind.
///
/// Lock order: `selection`, then `states`. The cache and gate lock internally
/// and never call back out.
pub(crate) struct ReportSlot<R: Report> {
  pub(crate) cache: CacheStore<R::Key, R>,
  pub(crate) gate: FetchGate<R::Key, R>,
  selection: Mutex<SelectionContext<R::Key>>,
  states: Mutex<HashMap<R::Key, watch::Sender<ObservableState<R>>>>,
  active: watch::Sender<ActiveChannel<R>>,
}

impl<R: Report> ReportSlot<R> {
  pub(crate) fn new(ttl: Duration) -> Self {
    let (active, _) = watch::channel(None);
    Self {
      cache: CacheStore::new(ttl),
      gate: FetchGate::new(),
      selection: Mutex::new(SelectionContext::new()),
      states: Mutex::new(HashMap::new()),
      active,
    }
  }

  fn selection(&self) -> MutexGuard<'_, SelectionContext<R::Key>> {
    self.selection.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Make `key` the active selection and publish its immediate state.
  ///
  /// Returns the new generation and whether a fetch has to be started (or
  /// joined). A fresh cache hit publishes `Loaded` right away; it still joins
  /// a fetch that is already running for the key so the selection sees its
  /// result.
  pub(crate) fn begin(&self, key: &R::Key, force: bool, now: DateTime<Utc>) -> (Generation, bool) {
    let mut selection = self.selection();
    let generation = selection.set_active(key.clone());

    let cached = self.cache.get(key);
    let fresh = cached
      .as_ref()
      .filter(|entry| !force && self.cache.is_fresh(entry, now))
      .map(|entry| entry.value.clone());

    let (state, needs_fetch) = match fresh {
      Some(value) => (ObservableState::Loaded(value), self.gate.is_in_flight(key)),
      None => (
        ObservableState::Loading {
          previous: cached.map(|entry| entry.value),
        },
        true,
      ),
    };

    self.publish(key, generation, true, state);
    (generation, needs_fetch)
  }

  /// Apply a finished fetch, if it is still wanted.
  ///
  /// Runs entirely under the selection lock, so no `select` or `refresh`
  /// can slip in between the staleness check and the write. A result is
  /// dropped if the caller was disposed, or if a fetch started no earlier
  /// already settled the key. Callers joined on one fetch share its origin,
  /// so the first live one publishes and the rest are `Stale`. The active
  /// channel sees the result whenever its key is still the selection.
  pub(crate) fn commit(
    &self,
    key: &R::Key,
    settled: Settled<R>,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
  ) -> Commit {
    let mut selection = self.selection();
    let Settled { origin, result } = settled;

    if cancel.is_cancelled() || matches!(result, Err(FetchError::Cancelled)) {
      return Commit::Cancelled;
    }
    if !selection.is_latest_for(key, origin) {
      return Commit::Stale;
    }
    selection.settle(key.clone(), origin);
    let current = selection.is_active(key);

    let state = match result {
      Ok(value) => {
        if !self.cache.put(key.clone(), value.clone(), now) {
          debug!(kind = %R::KIND, ?key, "kept newer cache entry");
        }
        ObservableState::Loaded(value)
      }
      Err(reason) => ObservableState::Failed {
        reason,
        previous: self.cache.get(key).map(|entry| entry.value),
      },
    };

    self.publish(key, selection.current_generation(), current, state);
    Commit::Published { current }
  }

  fn publish(
    &self,
    key: &R::Key,
    generation: Generation,
    current: bool,
    state: ObservableState<R>,
  ) {
    {
      let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
      match states.get(key) {
        Some(tx) => {
          tx.send_replace(state.clone());
        }
        None => {
          let (tx, _) = watch::channel(state.clone());
          states.insert(key.clone(), tx);
        }
      }
    }

    if current {
      self.active.send_replace(Some(ActiveState {
        key: key.clone(),
        generation,
        state,
      }));
    }
  }

  /// Subscribe to `key`'s state, creating the channel from the cache if new.
  pub(crate) fn subscribe(&self, key: &R::Key) -> watch::Receiver<ObservableState<R>> {
    let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
    states
      .entry(key.clone())
      .or_insert_with(|| watch::channel(self.initial_state(key)).0)
      .subscribe()
  }

  pub(crate) fn subscribe_active(&self) -> watch::Receiver<ActiveChannel<R>> {
    self.active.subscribe()
  }

  pub(crate) fn state(&self, key: &R::Key) -> ObservableState<R> {
    let states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
    match states.get(key) {
      Some(tx) => tx.borrow().clone(),
      None => self.initial_state(key),
    }
  }

  pub(crate) fn active_key(&self) -> Option<R::Key> {
    self.selection().active().cloned()
  }

  pub(crate) fn is_current(&self, key: &R::Key, generation: Generation) -> bool {
    self.selection().is_current(key, generation)
  }

  pub(crate) fn cached(&self, key: &R::Key) -> Option<CacheEntry<R>> {
    self.cache.get(key)
  }

  fn initial_state(&self, key: &R::Key) -> ObservableState<R> {
    match self.cache.get(key) {
      Some(entry) => ObservableState::Loaded(entry.value),
      None => ObservableState::Idle,
    }
  }
}
