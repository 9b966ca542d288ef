//! Selection keys: ISO weeks and look-back windows.
//!
//! Dates use `chrono::NaiveDate` directly and un-keyed reports use `()`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
  #[error("invalid ISO week {0:?}, expected YYYY-Www (e.g. 2026-W42)")]
  Week(String),
  #[error("invalid window {0:?}, expected 30 or 60")]
  Window(String),
}

/// An ISO-8601 week, Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoWeek {
  monday: NaiveDate,
}

impl IsoWeek {
  pub fn new(year: i32, week: u32) -> Option<Self> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(|monday| Self { monday })
  }

  /// The week `date` falls in.
  pub fn containing(date: NaiveDate) -> Self {
    let offset = date.weekday().num_days_from_monday();
    Self {
      monday: date - Duration::days(i64::from(offset)),
    }
  }

  pub fn start(&self) -> NaiveDate {
    self.monday
  }

  pub fn end(&self) -> NaiveDate {
    self.monday + Duration::days(6)
  }

  pub fn year(&self) -> i32 {
    self.monday.iso_week().year()
  }

  pub fn week(&self) -> u32 {
    self.monday.iso_week().week()
  }

  pub fn next(&self) -> Self {
    Self {
      monday: self.monday + Duration::days(7),
    }
  }

  pub fn previous(&self) -> Self {
    Self {
      monday: self.monday - Duration::days(7),
    }
  }
}

impl fmt::Display for IsoWeek {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-W{:02}", self.year(), self.week())
  }
}

impl FromStr for IsoWeek {
  type Err = ParseKeyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseKeyError::Week(s.to_string());
    let (year, week) = s.trim().split_once("-W").ok_or_else(err)?;
    let year: i32 = year.parse().map_err(|_| err())?;
    let week: u32 = week.parse().map_err(|_| err())?;
    IsoWeek::new(year, week).ok_or_else(err)
  }
}

impl Serialize for IsoWeek {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// Look-back window for the monthly life report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {
  #[default]
  Last30Days,
  Last60Days,
}

impl Window {
  pub fn days(self) -> u32 {
    match self {
      Window::Last30Days => 30,
      Window::Last60Days => 60,
    }
  }
}

impl fmt::Display for Window {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}d", self.days())
  }
}

impl FromStr for Window {
  type Err = ParseKeyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().trim_end_matches('d') {
      "30" => Ok(Window::Last30Days),
      "60" => Ok(Window::Last60Days),
      _ => Err(ParseKeyError::Window(s.to_string())),
    }
  }
}

impl Serialize for Window {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u32(self.days())
  }
}
