use async_trait::async_trait;
use serde_json::Value;

use super::api_types::ReportRequest;
use crate::error::FetchError;

/// The remote collaborator that generates insight reports.
///
/// Implementations return the raw JSON body; decoding into the report type
/// happens in [`crate::query::InsightQuery`]. They should not retry.
#[async_trait]
pub trait InsightService: Send + Sync {
  async fn fetch(&self, request: &ReportRequest) -> Result<Value, FetchError>;
}
