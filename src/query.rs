//! One cancellable call to the insight service for a typed report.
//!
//! `InsightQuery<R>` builds the request for a key, races the service call
//! against a `CancellationToken`, and decodes the JSON body into `R`. It never
//! retries and never touches the cache; both are the orchestrator's business.
//!
//! # Example
//!
//! ```ignore
//! let query = InsightQuery::<WeeklyNarrative>::new(service.clone());
//! let token = CancellationToken::new();
//!
//! match query.execute(&week, &token).await {
//!     Ok(narrative) => render(narrative),
//!     Err(FetchError::Cancelled) => {} // screen went away
//!     Err(e) => show_retry(e),
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::insights::{InsightService, Report, ReportRequest};

/// Typed, cancellable fetch of one report kind.
pub struct InsightQuery<R> {
  service: Arc<dyn InsightService>,
  _report: PhantomData<fn() -> R>,
}

impl<R> Clone for InsightQuery<R> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      _report: PhantomData,
    }
  }
}

impl<R: Report> InsightQuery<R> {
  pub fn new(service: Arc<dyn InsightService>) -> Self {
    Self {
      service,
      _report: PhantomData,
    }
  }

  /// The request sent for `key`.
  pub fn request(key: &R::Key) -> ReportRequest {
    ReportRequest {
      kind: R::KIND,
      params: R::params(key),
    }
  }

  /// Fetch and decode the report for `key`.
  ///
  /// Resolves to `Cancelled` as soon as `cancel` fires, dropping the
  /// in-progress service call.
  pub async fn execute(&self, key: &R::Key, cancel: &CancellationToken) -> Result<R, FetchError> {
    if cancel.is_cancelled() {
      return Err(FetchError::Cancelled);
    }

    let request = Self::request(key);
    let started = Instant::now();

    let body = tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!(kind = %R::KIND, ?key, "query cancelled");
        return Err(FetchError::Cancelled);
      }
      body = self.service.fetch(&request) => body?,
    };

    let report: R = serde_json::from_value(body)?;
    info!(
      kind = %R::KIND,
      ?key,
      elapsed_ms = started.elapsed().as_millis() as u64,
      "fetched report"
    );
    Ok(report)
  }
}

impl<R> std::fmt::Debug for InsightQuery<R> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InsightQuery")
      .field("report", &std::any::type_name::<R>())
      .finish_non_exhaustive()
  }
}
