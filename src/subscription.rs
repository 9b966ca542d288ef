//! Subscriber handle for orchestrator state.

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

/// A live view of one state channel.
///
/// Every subscriber of the same channel sees the same values; intermediate
/// states may be coalesced if a subscriber falls behind. The subscription
/// ends when the orchestrator scope that handed it out is disposed.
pub struct Subscription<S> {
  rx: watch::Receiver<S>,
  cancel: CancellationToken,
}

impl<S: Clone + Send + Sync + 'static> Subscription<S> {
  pub(crate) fn new(rx: watch::Receiver<S>, cancel: CancellationToken) -> Self {
    Self { rx, cancel }
  }

  /// The current value, without marking it seen.
  pub fn current(&self) -> S {
    self.rx.borrow().clone()
  }

  /// The current value, marking it seen.
  pub fn latest(&mut self) -> S {
    self.rx.borrow_and_update().clone()
  }

  /// Check for an unseen value without waiting.
  ///
  /// Returns `true` if the state changed since it was last seen. Call this
  /// from a tick handler.
  pub fn poll(&mut self) -> bool {
    if self.is_disposed() {
      return false;
    }
    match self.rx.has_changed() {
      Ok(true) => {
        self.rx.borrow_and_update();
        true
      }
      _ => false,
    }
  }

  /// Wait for the next value. `None` once disposed.
  pub async fn changed(&mut self) -> Option<S> {
    let cancel = self.cancel.clone();
    tokio::select! {
      biased;
      _ = cancel.cancelled() => return None,
      changed = self.rx.changed() => {
        if changed.is_err() {
          return None;
        }
      }
    }
    Some(self.rx.borrow_and_update().clone())
  }

  pub fn is_disposed(&self) -> bool {
    self.cancel.is_cancelled()
  }

  /// Stream of states, starting with the current one.
  pub fn into_stream(self) -> impl Stream<Item = S> + Send + 'static {
    let cancel = self.cancel;
    WatchStream::new(self.rx).take_until(async move { cancel.cancelled().await })
  }
}
