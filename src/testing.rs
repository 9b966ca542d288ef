//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::cache::ManualClock;
use crate::error::FetchError;
use crate::insights::{InsightService, ReportRequest};
use crate::subscription::Subscription;

/// A service call waiting for the test to answer it.
pub struct PendingCall {
  pub request: ReportRequest,
  responder: oneshot::Sender<Result<Value, FetchError>>,
}

impl PendingCall {
  pub fn respond(self, result: Result<Value, FetchError>) {
    let _ = self.responder.send(result);
  }

  /// True once the caller dropped the request, e.g. after cancellation.
  pub fn is_abandoned(&self) -> bool {
    self.responder.is_closed()
  }
}

/// Insight service whose every call is answered explicitly by the test.
pub struct ScriptedService {
  calls: AtomicUsize,
  tx: mpsc::UnboundedSender<PendingCall>,
  rx: Mutex<mpsc::UnboundedReceiver<PendingCall>>,
}

impl ScriptedService {
  pub fn new() -> Arc<Self> {
    let (tx, rx) = mpsc::unbounded_channel();
    Arc::new(Self {
      calls: AtomicUsize::new(0),
      tx,
      rx: Mutex::new(rx),
    })
  }

  /// Number of times the service was invoked.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Wait for the next call to arrive.
  pub async fn next_call(&self) -> PendingCall {
    let mut rx = self.rx.lock().await;
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
      .await
      .expect("no service call arrived")
      .expect("service channel closed")
  }

  /// The next call if one already arrived.
  pub async fn try_next_call(&self) -> Option<PendingCall> {
    self.rx.lock().await.try_recv().ok()
  }
}

#[async_trait]
impl InsightService for ScriptedService {
  async fn fetch(&self, request: &ReportRequest) -> Result<Value, FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let (responder, answer) = oneshot::channel();
    let _ = self.tx.send(PendingCall {
      request: request.clone(),
      responder,
    });
    answer.await.unwrap_or(Err(FetchError::NetworkUnavailable))
  }
}

pub fn epoch() -> DateTime<Utc> {
  DateTime::from_timestamp(1_790_000_000, 0).unwrap()
}

pub fn manual_clock() -> ManualClock {
  ManualClock::new(epoch())
}

/// Wait until the subscription's state satisfies `done`, and return it.
pub async fn wait_for<S, F>(sub: &mut Subscription<S>, done: F) -> S
where
  S: Clone + Send + Sync + 'static,
  F: Fn(&S) -> bool,
{
  tokio::time::timeout(Duration::from_secs(2), async {
    loop {
      let state = sub.latest();
      if done(&state) {
        return state;
      }
      sub.changed().await.expect("subscription ended while waiting");
    }
  })
  .await
  .expect("state never reached")
}

/// Give spawned tasks a chance to run.
pub async fn settle() {
  tokio::time::sleep(Duration::from_millis(20)).await;
}
