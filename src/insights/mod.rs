//! Insight report kinds, their selection keys and the remote service.

pub mod api_types;
mod client;
mod keys;
mod kind;
mod report;
mod service;
pub mod types;

pub use api_types::{ReportRequest, RequestParams};
pub use client::HttpInsightService;
pub use keys::{IsoWeek, ParseKeyError, Window};
pub use kind::{Report, ReportKind, SelectionKey};
pub use service::InsightService;
pub use types::{
  DailyInsight, EnergyPatterns, HealthInsights, MonthlyLifeReport, NextWeekForecast,
  PatternIntelligence, SimilarWeek, WeeklyNarrative,
};
