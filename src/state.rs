//! Observable report state published to presentation adapters.

use serde::Serialize;

use crate::error::FetchError;
use crate::selection::Generation;

/// What a subscriber should currently show for one report.
///
/// `previous` carries the last good value through refreshes and failures, so
/// a screen can keep showing stale data next to a spinner or a retry button
/// instead of blanking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ObservableState<T> {
  /// Nothing requested yet
  Idle,
  /// A fetch is running
  Loading { previous: Option<T> },
  /// The latest fetch succeeded
  Loaded(T),
  /// The latest fetch failed
  Failed {
    reason: FetchError,
    previous: Option<T>,
  },
}

impl<T> Default for ObservableState<T> {
  fn default() -> Self {
    ObservableState::Idle
  }
}

impl<T> ObservableState<T> {
  pub fn is_idle(&self) -> bool {
    matches!(self, ObservableState::Idle)
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, ObservableState::Loading { .. })
  }

  pub fn is_loaded(&self) -> bool {
    matches!(self, ObservableState::Loaded(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, ObservableState::Failed { .. })
  }

  /// Whatever value is worth showing: the loaded one, or the previous one
  /// while loading or after a failure.
  pub fn data(&self) -> Option<&T> {
    match self {
      ObservableState::Idle => None,
      ObservableState::Loaded(data) => Some(data),
      ObservableState::Loading { previous } | ObservableState::Failed { previous, .. } => {
        previous.as_ref()
      }
    }
  }

  pub fn error(&self) -> Option<&FetchError> {
    match self {
      ObservableState::Failed { reason, .. } => Some(reason),
      _ => None,
    }
  }
}

/// State of a kind's current selection, published only while current.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveState<K, T> {
  pub key: K,
  pub generation: Generation,
  pub state: ObservableState<T>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_data_falls_back_to_previous() {
    let loading = ObservableState::Loading { previous: Some(1) };
    assert_eq!(loading.data(), Some(&1));
    assert!(loading.is_loading());

    let failed = ObservableState::Failed {
      reason: FetchError::NetworkUnavailable,
      previous: Some(2),
    };
    assert_eq!(failed.data(), Some(&2));
    assert_eq!(failed.error(), Some(&FetchError::NetworkUnavailable));

    assert_eq!(ObservableState::<u8>::Idle.data(), None);
    assert_eq!(ObservableState::Loaded(3).data(), Some(&3));
  }

  #[test]
  fn test_serializes_with_state_tag() {
    let loaded = serde_json::to_value(ObservableState::Loaded(json!({ "overview": "x" }))).unwrap();
    assert_eq!(loaded, json!({ "state": "loaded", "data": { "overview": "x" } }));

    let failed = serde_json::to_value(ObservableState::<u8>::Failed {
      reason: FetchError::ServerError(500),
      previous: None,
    })
    .unwrap();
    assert_eq!(
      failed,
      json!({
        "state": "failed",
        "data": { "reason": { "kind": "server_error", "detail": 500 }, "previous": null }
      })
    );
  }
}
