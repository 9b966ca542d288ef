//! Request deduplication: at most one in-flight fetch per key.
//!
//! The first caller for a key spawns the work; everyone arriving while it runs
//! joins it and receives a clone of the same result. The in-flight entry is
//! removed by the spawned task itself, before the result becomes visible, so a
//! caller arriving after settlement always starts a fresh fetch.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::selection::Generation;

type SharedResult<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

struct InFlight<V> {
  id: u64,
  generation: Generation,
  result: SharedResult<V>,
  /// Callers currently awaiting `result`
  waiters: usize,
  /// Handed to the work; fired when the last waiter leaves
  cancel: CancellationToken,
}

type InFlightMap<K, V> = Arc<Mutex<HashMap<K, InFlight<V>>>>;

/// What one caller of `run_exclusive` got back.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<V> {
  /// Generation of the caller that started the fetch; joined callers share it
  pub origin: Generation,
  pub result: Result<V, FetchError>,
}

/// Deduplicates concurrent fetches for the same key.
pub struct FetchGate<K, V> {
  in_flight: InFlightMap<K, V>,
  next_id: AtomicU64,
}

impl<K, V> Default for FetchGate<K, V> {
  fn default() -> Self {
    Self {
      in_flight: Arc::new(Mutex::new(HashMap::new())),
      next_id: AtomicU64::new(0),
    }
  }
}

impl<K, V> FetchGate<K, V>
where
  K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
  V: Clone + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self::default()
  }

  /// Run `work` for `key`, or join the fetch already running for it.
  ///
  /// `work` receives a token that fires only once every caller interested in
  /// the fetch has been cancelled. If `cancel` fires first this caller leaves
  /// with `Cancelled` and the fetch keeps running for the others.
  ///
  /// Callers from different generations join the same fetch. The result
  /// carries the generation that started it, so callers can tell how recent
  /// the data is.
  pub async fn run_exclusive<F, Fut>(
    &self,
    key: K,
    generation: Generation,
    cancel: &CancellationToken,
    work: F,
  ) -> Settled<V>
  where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
  {
    if cancel.is_cancelled() {
      return Settled {
        origin: generation,
        result: Err(FetchError::Cancelled),
      };
    }

    let (id, origin, result) = self.join_or_start(key.clone(), generation, work);

    let result = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        self.leave(&key, id);
        Err(FetchError::Cancelled)
      }
      result = result => result,
    };
    Settled { origin, result }
  }

  fn join_or_start<F, Fut>(
    &self,
    key: K,
    generation: Generation,
    work: F,
  ) -> (u64, Generation, SharedResult<V>)
  where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
  {
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = in_flight.get_mut(&key) {
      existing.waiters += 1;
      debug!(
        ?key,
        %generation,
        started_by = %existing.generation,
        waiters = existing.waiters,
        "joining in-flight fetch"
      );
      return (existing.id, existing.generation, existing.result.clone());
    }

    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let cancel = CancellationToken::new();
    let future = work(cancel.clone());

    let map = Arc::clone(&self.in_flight);
    let settle_key = key.clone();
    let handle = tokio::spawn(async move {
      let result = future.await;
      remove_if(&map, &settle_key, id);
      result
    });

    let result = async move {
      match handle.await {
        Ok(result) => result,
        Err(err) => {
          warn!(error = %err, "fetch task did not complete");
          Err(FetchError::Cancelled)
        }
      }
    }
    .boxed()
    .shared();

    info!(?key, %generation, "starting fetch");
    in_flight.insert(
      key,
      InFlight {
        id,
        generation,
        result: result.clone(),
        waiters: 1,
        cancel,
      },
    );

    (id, generation, result)
  }

  /// A waiter stopped caring. Cancel the work once nobody is left.
  fn leave(&self, key: &K, id: u64) {
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(entry) = in_flight.get_mut(key).filter(|entry| entry.id == id) else {
      return;
    };

    entry.waiters = entry.waiters.saturating_sub(1);
    if entry.waiters == 0 {
      debug!(?key, "last waiter left, cancelling fetch");
      entry.cancel.cancel();
      in_flight.remove(key);
    }
  }

  pub fn is_in_flight(&self, key: &K) -> bool {
    self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(key)
  }

  /// Number of keys with a fetch currently running.
  pub fn in_flight(&self) -> usize {
    self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

fn remove_if<K: Eq + Hash, V>(map: &Mutex<HashMap<K, InFlight<V>>>, key: &K, id: u64) {
  let mut in_flight = map.lock().unwrap_or_else(PoisonError::into_inner);
  if in_flight.get(key).is_some_and(|entry| entry.id == id) {
    in_flight.remove(key);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;
  use tokio::sync::oneshot;

  fn gate() -> Arc<FetchGate<&'static str, u32>> {
    Arc::new(FetchGate::new())
  }

  #[tokio::test]
  async fn test_concurrent_callers_share_one_fetch() {
    let gate = gate();
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = oneshot::channel::<u32>();
    let rx = Arc::new(Mutex::new(Some(rx)));

    let mut handles = Vec::new();
    for n in 0..5 {
      let gate = Arc::clone(&gate);
      let calls = Arc::clone(&calls);
      let rx = Arc::clone(&rx);
      handles.push(tokio::spawn(async move {
        let token = CancellationToken::new();
        gate
          .run_exclusive("w1", Generation::from(n), &token, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            let rx = rx.lock().unwrap().take().expect("work started twice");
            async move { rx.await.map_err(|_| FetchError::Cancelled) }
          })
          .await
      }));
    }

    // Let every caller reach the gate
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(gate.is_in_flight(&"w1"));
    tx.send(7).unwrap();

    for handle in handles {
      assert_eq!(handle.await.unwrap().result, Ok(7));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(gate.in_flight(), 0);
  }

  #[tokio::test]
  async fn test_failure_is_shared_and_cleared() {
    let gate = gate();
    let token = CancellationToken::new();

    let first = gate
      .run_exclusive("w1", Generation::from(1), &token, |_| async {
        Err(FetchError::ServerError(500))
      })
      .await;
    assert_eq!(first.result, Err(FetchError::ServerError(500)));
    assert!(!gate.is_in_flight(&"w1"));

    // Next caller starts a fresh fetch instead of seeing the old failure
    let second = gate
      .run_exclusive("w1", Generation::from(2), &token, |_| async { Ok(3) })
      .await;
    assert_eq!(
      second,
      Settled {
        origin: Generation::from(2),
        result: Ok(3)
      }
    );
  }

  #[tokio::test]
  async fn test_different_keys_run_independently() {
    let gate = gate();
    let token = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let run = |key: &'static str, value: u32| {
      let gate = Arc::clone(&gate);
      let calls = Arc::clone(&calls);
      let token = token.clone();
      async move {
        gate
          .run_exclusive(key, Generation::from(1), &token, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
              tokio::time::sleep(Duration::from_millis(5)).await;
              Ok(value)
            }
          })
          .await
      }
    };

    let (a, b) = tokio::join!(run("w1", 1), run("w2", 2));
    assert_eq!((a.result, b.result), (Ok(1), Ok(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_last_waiter_leaving_cancels_work() {
    let gate = gate();
    let token = CancellationToken::new();
    let (seen_tx, seen_rx) = oneshot::channel::<CancellationToken>();

    let caller = {
      let gate = Arc::clone(&gate);
      let token = token.clone();
      tokio::spawn(async move {
        gate
          .run_exclusive("w1", Generation::from(1), &token, move |work_cancel| {
            let _ = seen_tx.send(work_cancel.clone());
            async move {
              work_cancel.cancelled().await;
              Err(FetchError::Cancelled)
            }
          })
          .await
      })
    };

    let work_cancel = seen_rx.await.unwrap();
    assert!(!work_cancel.is_cancelled());

    token.cancel();
    assert_eq!(caller.await.unwrap().result, Err(FetchError::Cancelled));
    assert!(work_cancel.is_cancelled());
    assert!(!gate.is_in_flight(&"w1"));
  }

  #[tokio::test]
  async fn test_one_waiter_leaving_keeps_fetch_for_others() {
    let gate = gate();
    let leaving = CancellationToken::new();
    let staying = CancellationToken::new();
    let (tx, rx) = oneshot::channel::<u32>();

    let first = {
      let gate = Arc::clone(&gate);
      let leaving = leaving.clone();
      tokio::spawn(async move {
        gate
          .run_exclusive("w1", Generation::from(1), &leaving, move |_| async move {
            rx.await.map_err(|_| FetchError::Cancelled)
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    let second = {
      let gate = Arc::clone(&gate);
      let staying = staying.clone();
      tokio::spawn(async move {
        gate
          .run_exclusive("w1", Generation::from(2), &staying, |_| async {
            Err::<u32, _>(FetchError::Unauthorized)
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    leaving.cancel();
    assert_eq!(first.await.unwrap().result, Err(FetchError::Cancelled));
    assert!(gate.is_in_flight(&"w1"));

    tx.send(9).unwrap();
    // The joined caller gets the value and the generation that started it
    assert_eq!(
      second.await.unwrap(),
      Settled {
        origin: Generation::from(1),
        result: Ok(9)
      }
    );
  }

  #[tokio::test]
  async fn test_already_cancelled_caller_never_starts_work() {
    let gate = gate();
    let token = CancellationToken::new();
    token.cancel();

    let started = AtomicUsize::new(0);

    let result = gate
      .run_exclusive("w1", Generation::from(1), &token, |_| {
        started.fetch_add(1, Ordering::SeqCst);
        async { Ok(1) }
      })
      .await;
    assert_eq!(result.result, Err(FetchError::Cancelled));
    assert_eq!(started.load(Ordering::SeqCst), 0);
    assert_eq!(gate.in_flight(), 0);
  }
}
