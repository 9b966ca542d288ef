//! Failure taxonomy for insight fetches.

use serde::Serialize;
use thiserror::Error;

/// Why a single insight fetch did not produce a report.
///
/// Cloneable so every caller joined on the same in-flight fetch receives an
/// identical copy of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
  /// Transport failure: no connection, DNS, TLS or a timeout
  #[error("insight service is unreachable")]
  NetworkUnavailable,
  /// The service rejected our credentials
  #[error("not authorized to read insights")]
  Unauthorized,
  /// The service answered with a non-success status
  #[error("insight service returned HTTP {0}")]
  ServerError(u16),
  /// The response body did not match the expected report shape
  #[error("could not decode insight response: {0}")]
  DecodeError(String),
  /// The caller went away before the fetch finished
  #[error("fetch was cancelled")]
  Cancelled,
}

impl FetchError {
  /// Cancellation is an expected race, never something to show the user.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, FetchError::Cancelled)
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(err: serde_json::Error) -> Self {
    FetchError::DecodeError(err.to_string())
  }
}
