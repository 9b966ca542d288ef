use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::api_types::ReportRequest;
use super::kind::ReportKind;
use super::service::InsightService;
use crate::config::{Config, ServiceConfig};
use crate::error::FetchError;

/// HTTP client for the insight service
#[derive(Clone)]
pub struct HttpInsightService {
  http: reqwest::Client,
  endpoints: HashMap<ReportKind, Url>,
  token: Option<String>,
}

impl HttpInsightService {
  pub fn new(config: &ServiceConfig) -> Result<Self> {
    let base = config.base_url()?;
    let token = Config::get_api_token();

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .gzip(true)
      .deflate(true)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let endpoints = ReportKind::ALL
      .into_iter()
      .map(|kind| {
        base
          .join(kind.endpoint())
          .map(|url| (kind, url))
          .map_err(|e| eyre!("Invalid endpoint for {}: {}", kind, e))
      })
      .collect::<Result<HashMap<_, _>>>()?;

    Ok(Self {
      http,
      endpoints,
      token,
    })
  }

  pub fn endpoint(&self, kind: ReportKind) -> Option<&Url> {
    self.endpoints.get(&kind)
  }
}

#[async_trait]
impl InsightService for HttpInsightService {
  async fn fetch(&self, request: &ReportRequest) -> Result<Value, FetchError> {
    let url = self
      .endpoint(request.kind)
      .cloned()
      .ok_or(FetchError::NetworkUnavailable)?;

    debug!(kind = %request.kind, %url, "requesting report");
    let mut builder = self.http.post(url).json(&request.params);
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }

    let response = builder.send().await.map_err(|e| {
      warn!(kind = %request.kind, error = %e, "insight request failed");
      classify_transport(&e)
    })?;

    if let Some(err) = classify_status(response.status()) {
      warn!(kind = %request.kind, status = %response.status(), "insight service refused request");
      return Err(err);
    }

    let body = response.bytes().await.map_err(|e| classify_transport(&e))?;
    Ok(serde_json::from_slice(&body)?)
  }
}

/// Map a response status to a failure, or `None` for success.
fn classify_status(status: StatusCode) -> Option<FetchError> {
  if status.is_success() {
    return None;
  }
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(FetchError::Unauthorized),
    _ => Some(FetchError::ServerError(status.as_u16())),
  }
}

/// Timeouts and connection failures both surface as `NetworkUnavailable`.
fn classify_transport(err: &reqwest::Error) -> FetchError {
  if err.is_decode() {
    FetchError::DecodeError(err.to_string())
  } else if let Some(status) = err.status() {
    classify_status(status).unwrap_or(FetchError::ServerError(status.as_u16()))
  } else {
    FetchError::NetworkUnavailable
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn service(url: &str) -> HttpInsightService {
    let config = ServiceConfig {
      url: Some(url.to_string()),
      timeout_secs: 5,
    };
    HttpInsightService::new(&config).unwrap()
  }

  #[test]
  fn test_endpoints_resolve_under_base_path() {
    let with_slash = service("https://insights.example.com/api/v1/");
    let without_slash = service("https://insights.example.com/api/v1");

    for svc in [with_slash, without_slash] {
      assert_eq!(
        svc.endpoint(ReportKind::WeeklyNarrative).unwrap().as_str(),
        "https://insights.example.com/api/v1/weekly-narrative"
      );
      assert_eq!(
        svc.endpoint(ReportKind::Daily).unwrap().as_str(),
        "https://insights.example.com/api/v1/daily"
      );
    }
  }

  #[test]
  fn test_status_mapping() {
    assert_eq!(classify_status(StatusCode::OK), None);
    assert_eq!(
      classify_status(StatusCode::UNAUTHORIZED),
      Some(FetchError::Unauthorized)
    );
    assert_eq!(
      classify_status(StatusCode::FORBIDDEN),
      Some(FetchError::Unauthorized)
    );
    assert_eq!(
      classify_status(StatusCode::BAD_GATEWAY),
      Some(FetchError::ServerError(502))
    );
    assert_eq!(
      classify_status(StatusCode::NOT_FOUND),
      Some(FetchError::ServerError(404))
    );
  }

  #[tokio::test]
  async fn test_unreachable_service_is_network_unavailable() {
    // Port 9 (discard) on localhost is expected to refuse connections
    let svc = service("http://127.0.0.1:9/");
    let request = ReportRequest {
      kind: ReportKind::EnergyPatterns,
      params: crate::insights::RequestParams::Recent {},
    };
    assert_eq!(
      svc.fetch(&request).await,
      Err(FetchError::NetworkUnavailable)
    );
  }
}
