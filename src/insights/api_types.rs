//! Request shapes sent to the insight service.
//!
//! Responses decode straight into the report types in `types`, so only the
//! outgoing side needs its own types here.

use chrono::NaiveDate;
use serde::Serialize;

use super::keys::{IsoWeek, Window};
use super::kind::ReportKind;

/// JSON body of a report request. Serialized without a tag; the endpoint
/// already says which report is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
  Date {
    date: NaiveDate,
  },
  Week {
    #[serde(rename = "weekStart")]
    week_start: NaiveDate,
    #[serde(rename = "weekEnd")]
    week_end: NaiveDate,
  },
  Window {
    days: u32,
  },
  /// Reports derived from recent history take no parameters
  Recent {},
}

impl RequestParams {
  pub fn week(week: &IsoWeek) -> Self {
    RequestParams::Week {
      week_start: week.start(),
      week_end: week.end(),
    }
  }

  pub fn window(window: Window) -> Self {
    RequestParams::Window {
      days: window.days(),
    }
  }
}

/// One call to the insight service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportRequest {
  pub kind: ReportKind,
  pub params: RequestParams,
}
