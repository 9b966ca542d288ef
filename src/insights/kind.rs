use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use super::api_types::RequestParams;

/// Which insight report is being fetched. Each kind has its own result type
/// and its own cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
  Daily,
  WeeklyNarrative,
  NextWeekForecast,
  PatternIntelligence,
  MonthlyLife,
  EnergyPatterns,
  SimilarWeek,
  HealthInsights,
}

impl ReportKind {
  pub const ALL: [ReportKind; 8] = [
    ReportKind::Daily,
    ReportKind::WeeklyNarrative,
    ReportKind::NextWeekForecast,
    ReportKind::PatternIntelligence,
    ReportKind::MonthlyLife,
    ReportKind::EnergyPatterns,
    ReportKind::SimilarWeek,
    ReportKind::HealthInsights,
  ];

  /// Path segment of this kind's endpoint, relative to the service base URL.
  pub fn endpoint(self) -> &'static str {
    match self {
      Self::Daily => "daily",
      Self::WeeklyNarrative => "weekly-narrative",
      Self::NextWeekForecast => "next-week-forecast",
      Self::PatternIntelligence => "pattern-intelligence",
      Self::MonthlyLife => "monthly-life",
      Self::EnergyPatterns => "energy-patterns",
      Self::SimilarWeek => "similar-week",
      Self::HealthInsights => "health-insights",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::Daily => "daily",
      Self::WeeklyNarrative => "weekly_narrative",
      Self::NextWeekForecast => "next_week_forecast",
      Self::PatternIntelligence => "pattern_intelligence",
      Self::MonthlyLife => "monthly_life",
      Self::EnergyPatterns => "energy_patterns",
      Self::SimilarWeek => "similar_week",
      Self::HealthInsights => "health_insights",
    }
  }
}

impl fmt::Display for ReportKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Identifies which instance of a report is requested (a date, a week, a
/// window, or `()` for reports with a single global instance).
pub trait SelectionKey:
  Clone + Eq + Hash + fmt::Debug + Serialize + Send + Sync + 'static
{
}

impl<T> SelectionKey for T where
  T: Clone + Eq + Hash + fmt::Debug + Serialize + Send + Sync + 'static
{
}

/// A report type the orchestrator can fetch, cache and publish.
pub trait Report:
  Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
  /// What selects one instance of this report
  type Key: SelectionKey;

  const KIND: ReportKind;

  /// Request parameters sent to the insight service for `key`.
  fn params(key: &Self::Key) -> RequestParams;
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn test_endpoints_are_unique() {
    let endpoints: HashSet<_> = ReportKind::ALL.iter().map(|k| k.endpoint()).collect();
    assert_eq!(endpoints.len(), ReportKind::ALL.len());
  }

  #[test]
  fn test_name_matches_serde() {
    for kind in ReportKind::ALL {
      let json = serde_json::to_string(&kind).unwrap();
      assert_eq!(json, format!("\"{}\"", kind.name()));
    }
  }
}
