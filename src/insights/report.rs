//! Binds each report type to its kind, key and request parameters.

use chrono::NaiveDate;

use super::api_types::RequestParams;
use super::keys::{IsoWeek, Window};
use super::kind::{Report, ReportKind};
use super::types::{
  DailyInsight, EnergyPatterns, HealthInsights, MonthlyLifeReport, NextWeekForecast,
  PatternIntelligence, SimilarWeek, WeeklyNarrative,
};

impl Report for DailyInsight {
  type Key = NaiveDate;
  const KIND: ReportKind = ReportKind::Daily;

  fn params(date: &NaiveDate) -> RequestParams {
    RequestParams::Date { date: *date }
  }
}

impl Report for WeeklyNarrative {
  type Key = IsoWeek;
  const KIND: ReportKind = ReportKind::WeeklyNarrative;

  fn params(week: &IsoWeek) -> RequestParams {
    RequestParams::week(week)
  }
}

impl Report for NextWeekForecast {
  type Key = IsoWeek;
  const KIND: ReportKind = ReportKind::NextWeekForecast;

  fn params(week: &IsoWeek) -> RequestParams {
    RequestParams::week(week)
  }
}

impl Report for PatternIntelligence {
  type Key = IsoWeek;
  const KIND: ReportKind = ReportKind::PatternIntelligence;

  fn params(week: &IsoWeek) -> RequestParams {
    RequestParams::week(week)
  }
}

impl Report for HealthInsights {
  type Key = IsoWeek;
  const KIND: ReportKind = ReportKind::HealthInsights;

  fn params(week: &IsoWeek) -> RequestParams {
    RequestParams::week(week)
  }
}

impl Report for MonthlyLifeReport {
  type Key = Window;
  const KIND: ReportKind = ReportKind::MonthlyLife;

  fn params(window: &Window) -> RequestParams {
    RequestParams::window(*window)
  }
}

impl Report for EnergyPatterns {
  type Key = ();
  const KIND: ReportKind = ReportKind::EnergyPatterns;

  fn params(_: &()) -> RequestParams {
    RequestParams::Recent {}
  }
}

impl Report for SimilarWeek {
  type Key = ();
  const KIND: ReportKind = ReportKind::SimilarWeek;

  fn params(_: &()) -> RequestParams {
    RequestParams::Recent {}
  }
}
