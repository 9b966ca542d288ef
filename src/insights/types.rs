//! Decoded insight reports.
//!
//! Every collection and optional section defaults when absent so a sparse
//! response still decodes; only the fields a report cannot exist without are
//! required.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Shared building blocks
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
  pub label: String,
  pub minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
  pub sleep_hours: Option<f64>,
  pub steps: Option<u32>,
  pub resting_heart_rate: Option<u32>,
  pub hrv_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSignal {
  pub title: String,
  #[serde(default)]
  pub detail: String,
  /// "low", "medium" or "high"
  #[serde(default)]
  pub severity: String,
}

// ============================================================================
// Daily
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
  pub completed: u32,
  pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
  pub total_events: u32,
  pub meetings: u32,
  pub focus_blocks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyInsight {
  #[serde(default)]
  pub tone: String,
  #[serde(default)]
  pub completion: CompletionStats,
  pub summary: String,
  #[serde(default)]
  pub time_breakdown: Vec<TimeBucket>,
  #[serde(default)]
  pub event_stats: EventStats,
  pub health: Option<HealthSummary>,
  #[serde(default)]
  pub highlights: Vec<String>,
}

// ============================================================================
// Weekly narrative
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekAggregates {
  pub total_events: u32,
  pub meeting_hours: f64,
  pub focus_hours: f64,
  pub completed_tasks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekComparison {
  pub meeting_hours_delta: f64,
  pub focus_hours_delta: f64,
  #[serde(default)]
  pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthGoal {
  pub name: String,
  pub target: f64,
  pub actual: f64,
  #[serde(default)]
  pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyNarrative {
  #[serde(default)]
  pub tone: String,
  pub overview: String,
  #[serde(default)]
  pub aggregates: WeekAggregates,
  pub comparison: Option<WeekComparison>,
  #[serde(default)]
  pub health_goals: Vec<HealthGoal>,
  #[serde(default)]
  pub time_buckets: Vec<TimeBucket>,
  #[serde(default)]
  pub stress_signals: Vec<String>,
  #[serde(default)]
  pub suggestions: Vec<String>,
}

// ============================================================================
// Next week forecast
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
  pub date: NaiveDate,
  /// 0.0 (empty) to 1.0 (overloaded)
  pub intensity: f64,
  #[serde(default)]
  pub meeting_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextWeekForecast {
  #[serde(default)]
  pub days: Vec<DayForecast>,
  #[serde(default)]
  pub risk_signals: Vec<RiskSignal>,
  #[serde(default)]
  pub interventions: Vec<String>,
}

// ============================================================================
// Pattern intelligence
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPrediction {
  pub date: NaiveDate,
  pub predicted_outcome: String,
  #[serde(default)]
  pub confidence: f64,
  #[serde(default)]
  pub similar_days: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternIntelligence {
  #[serde(default)]
  pub days: Vec<DayPrediction>,
  #[serde(default)]
  pub patterns: Vec<String>,
}

// ============================================================================
// Monthly life report
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetric {
  pub label: String,
  pub value: String,
  /// Change against the previous window, e.g. "+12%"
  pub change: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryDebt {
  pub hours: f64,
  #[serde(default)]
  pub trend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLifeReport {
  pub headline: String,
  #[serde(default)]
  pub key_metrics: Vec<KeyMetric>,
  #[serde(default)]
  pub patterns: Vec<String>,
  #[serde(default)]
  pub patterns_to_watch: Vec<String>,
  #[serde(default)]
  pub wins: Vec<String>,
  pub recovery_debt: Option<RecoveryDebt>,
  pub cognitive_forecast: Option<String>,
  pub future_impact_risk: Option<String>,
}

// ============================================================================
// History-derived reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyCorrelation {
  /// Schedule-side signal, e.g. "meeting hours"
  pub schedule_metric: String,
  /// Health-side signal, e.g. "sleep hours"
  pub health_metric: String,
  /// Pearson coefficient in -1.0..=1.0
  pub coefficient: f64,
  #[serde(default)]
  pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPatterns {
  #[serde(default)]
  pub correlations: Vec<EnergyCorrelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarWeek {
  pub week_start: NaiveDate,
  /// 0.0 to 1.0
  pub similarity: f64,
  #[serde(default)]
  pub outcomes: Vec<String>,
  pub prediction: Option<String>,
}

// ============================================================================
// Health insights
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
  pub metric: String,
  pub average: f64,
  /// "up", "down" or "flat"
  #[serde(default)]
  pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInsights {
  pub summary: String,
  #[serde(default)]
  pub trends: Vec<MetricTrend>,
  #[serde(default)]
  pub correlations: Vec<EnergyCorrelation>,
}
