//! Fetches, caches, deduplicates and publishes insight reports.
//!
//! One `InsightOrchestrator` owns the process-wide state for every report
//! kind: a TTL cache, a fetch gate and a selection context per kind, plus the
//! watch channels subscribers read from. Screens that come and go get their
//! own handle through [`InsightOrchestrator::scope`]: scopes share all of that
//! state but each has its own cancellation, so disposing one screen never
//! tears down another screen's fetches.
//!
//! Every result goes through the same commit step. It is cached and published
//! for its key unless the caller was disposed or a fetch started no earlier
//! already settled that key, and published to the kind's active channel only
//! if its key is still selected. Callers joined on one fetch share it, so one
//! disposed screen never takes the result away from another.

mod slot;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::cache::{CacheEntry, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::insights::{InsightService, Report, ReportKind};
use crate::query::InsightQuery;
use crate::selection::Generation;
use crate::state::{ActiveState, ObservableState};
use crate::subscription::Subscription;

use slot::{Commit, ReportSlot};

/// State shared by every scope of one orchestrator.
struct Shared {
  service: Arc<dyn InsightService>,
  clock: Arc<dyn Clock>,
  cache: CacheConfig,
  slots: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Shared {
  /// The slot for report type `R`, created on first use.
  fn slot<R: Report>(&self) -> Arc<ReportSlot<R>> {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let id = TypeId::of::<ReportSlot<R>>();

    if let Some(slot) = slots
      .get(&id)
      .and_then(|slot| Arc::clone(slot).downcast::<ReportSlot<R>>().ok())
    {
      return slot;
    }

    let slot = Arc::new(ReportSlot::<R>::new(self.cache.ttl_for(R::KIND)));
    slots.insert(id, Arc::clone(&slot) as Arc<dyn Any + Send + Sync>);
    slot
  }
}

/// Entry point for presentation adapters.
///
/// `select`, `refresh` and `observe` must be called from within a Tokio
/// runtime; fetches run as spawned tasks.
pub struct InsightOrchestrator {
  shared: Arc<Shared>,
  /// This scope's cancellation token per kind, replaced on dispose
  tokens: Mutex<HashMap<ReportKind, CancellationToken>>,
}

impl InsightOrchestrator {
  pub fn new(service: Arc<dyn InsightService>, cache: CacheConfig) -> Self {
    Self::with_clock(service, cache, Arc::new(SystemClock))
  }

  pub fn with_clock(
    service: Arc<dyn InsightService>,
    cache: CacheConfig,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      shared: Arc::new(Shared {
        service,
        clock,
        cache,
        slots: Mutex::new(HashMap::new()),
      }),
      tokens: Mutex::new(HashMap::new()),
    }
  }

  /// A new handle sharing caches, gates, selections and state channels, with
  /// its own cancellation scope.
  pub fn scope(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
      tokens: Mutex::new(HashMap::new()),
    }
  }

  /// Show `key`: serve a fresh cached value immediately, otherwise publish
  /// `Loading` (with any stale value) and fetch.
  pub fn select<R: Report>(&self, key: R::Key) -> Generation {
    self.begin::<R>(key, false)
  }

  /// Like `select`, but always fetches. Joins a fetch already running for
  /// the key instead of starting another.
  pub fn refresh<R: Report>(&self, key: R::Key) -> Generation {
    self.begin::<R>(key, true)
  }

  /// Subscribe to the state of one `(kind, key)`. Never triggers a fetch.
  pub fn observe<R: Report>(&self, key: &R::Key) -> Subscription<ObservableState<R>> {
    let rx = self.shared.slot::<R>().subscribe(key);
    Subscription::new(rx, self.token(R::KIND))
  }

  /// Subscribe to whatever is currently selected for the kind.
  pub fn observe_active<R: Report>(&self) -> Subscription<Option<ActiveState<R::Key, R>>> {
    let rx = self.shared.slot::<R>().subscribe_active();
    Subscription::new(rx, self.token(R::KIND))
  }

  /// Cancel every fetch this scope started for `kind` and end the
  /// subscriptions it handed out. Fetches other scopes are still waiting on
  /// keep running for them.
  pub fn dispose(&self, kind: ReportKind) {
    let token = self
      .tokens
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&kind);

    if let Some(token) = token {
      info!(%kind, "disposing scope");
      token.cancel();
    }
  }

  /// Snapshot of the state for `key`.
  pub fn state<R: Report>(&self, key: &R::Key) -> ObservableState<R> {
    self.shared.slot::<R>().state(key)
  }

  pub fn active_key<R: Report>(&self) -> Option<R::Key> {
    self.shared.slot::<R>().active_key()
  }

  /// Whether `generation` from `select`/`refresh` of `key` is still the
  /// kind's latest selection.
  pub fn is_current<R: Report>(&self, key: &R::Key, generation: Generation) -> bool {
    self.shared.slot::<R>().is_current(key, generation)
  }

  /// The cached entry for `key`, fresh or not.
  pub fn cached<R: Report>(&self, key: &R::Key) -> Option<CacheEntry<R>> {
    self.shared.slot::<R>().cached(key)
  }

  /// Drop the cached entry for `key`; the next `select` fetches.
  pub fn invalidate<R: Report>(&self, key: &R::Key) {
    self.shared.slot::<R>().cache.invalidate(key);
  }

  fn token(&self, kind: ReportKind) -> CancellationToken {
    self
      .tokens
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(kind)
      .or_default()
      .clone()
  }

  fn begin<R: Report>(&self, key: R::Key, force: bool) -> Generation {
    let slot = self.shared.slot::<R>();
    let (generation, needs_fetch) = slot.begin(&key, force, self.shared.clock.now());

    if needs_fetch {
      self.spawn_fetch(slot, key, generation);
    } else {
      debug!(kind = %R::KIND, ?key, %generation, "served from cache");
    }
    generation
  }

  fn spawn_fetch<R: Report>(&self, slot: Arc<ReportSlot<R>>, key: R::Key, generation: Generation) {
    let cancel = self.token(R::KIND);
    let query = InsightQuery::<R>::new(Arc::clone(&self.shared.service));
    let clock = Arc::clone(&self.shared.clock);
    let span = tracing::info_span!("fetch", kind = %R::KIND, key = ?key, %generation);

    tokio::spawn(
      async move {
        let work_key = key.clone();
        let settled = slot
          .gate
          .run_exclusive(key.clone(), generation, &cancel, move |work_cancel| async move {
            query.execute(&work_key, &work_cancel).await
          })
          .await;

        if let Err(err) = &settled.result {
          if !err.is_cancelled() {
            warn!(error = %err, origin = %settled.origin, "fetch failed");
          }
        }

        match slot.commit(&key, settled, clock.now(), &cancel) {
          Commit::Published { current } => debug!(current, "published result"),
          Commit::Stale => debug!("discarded stale result"),
          Commit::Cancelled => debug!("discarded cancelled fetch"),
        }
      }
      .instrument(span),
    );
  }
}
