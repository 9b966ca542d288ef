//! Report names and lookup logic for the command line

use crate::insights::ReportKind;

#[derive(Debug, Clone)]
pub struct ReportCommand {
  pub kind: ReportKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub key_hint: &'static str,
  pub description: &'static str,
}

/// All reports, in display order
pub const REPORTS: &[ReportCommand] = &[
  ReportCommand {
    kind: ReportKind::Daily,
    name: "daily",
    aliases: &["d", "day", "today"],
    key_hint: "YYYY-MM-DD",
    description: "One day's summary, time breakdown and health",
  },
  ReportCommand {
    kind: ReportKind::WeeklyNarrative,
    name: "weekly",
    aliases: &["w", "week", "narrative"],
    key_hint: "YYYY-Www",
    description: "Narrative review of a week",
  },
  ReportCommand {
    kind: ReportKind::NextWeekForecast,
    name: "forecast",
    aliases: &["f", "next", "next-week"],
    key_hint: "YYYY-Www",
    description: "Load forecast and risk signals for a coming week",
  },
  ReportCommand {
    kind: ReportKind::PatternIntelligence,
    name: "patterns",
    aliases: &["p", "predict", "intelligence"],
    key_hint: "YYYY-Www",
    description: "Per-day predictions from historical patterns",
  },
  ReportCommand {
    kind: ReportKind::MonthlyLife,
    name: "monthly",
    aliases: &["m", "month", "life"],
    key_hint: "30|60",
    description: "Rolling 30 or 60 day life report",
  },
  ReportCommand {
    kind: ReportKind::EnergyPatterns,
    name: "energy",
    aliases: &["e", "correlations"],
    key_hint: "",
    description: "Schedule and health correlations",
  },
  ReportCommand {
    kind: ReportKind::SimilarWeek,
    name: "similar",
    aliases: &["s", "similar-week"],
    key_hint: "",
    description: "Most similar past week to the current one",
  },
  ReportCommand {
    kind: ReportKind::HealthInsights,
    name: "health",
    aliases: &["h", "vitals"],
    key_hint: "YYYY-Www",
    description: "Health trends for a week",
  },
];

/// Get matching reports for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static ReportCommand> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return REPORTS.iter().collect();
  }

  let mut matches: Vec<(&ReportCommand, u32)> = Vec::new();

  for report in REPORTS {
    // Exact match on name or kind
    if report.name == input_lower || report.kind.name() == input_lower {
      matches.push((report, 0));
      continue;
    }

    if report.aliases.contains(&input_lower.as_str()) {
      matches.push((report, 1));
      continue;
    }

    if report.name.starts_with(&input_lower) {
      matches.push((report, 2));
      continue;
    }

    if report.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((report, 3));
      continue;
    }

    // Fuzzy (contains)
    if report.name.contains(&input_lower) || report.kind.name().contains(&input_lower) {
      matches.push((report, 4));
      continue;
    }

    if report.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((report, 5));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(report, _)| report).collect()
}

/// The best matching report kind, if any.
pub fn resolve(input: &str) -> Option<ReportKind> {
  if input.trim().is_empty() {
    return None;
  }
  get_suggestions(input.trim()).first().map(|report| report.kind)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), REPORTS.len());
  }

  #[test]
  fn test_every_kind_is_listed_once() {
    for kind in ReportKind::ALL {
      assert_eq!(REPORTS.iter().filter(|r| r.kind == kind).count(), 1);
    }
  }

  #[test]
  fn test_exact_match() {
    assert_eq!(resolve("weekly"), Some(ReportKind::WeeklyNarrative));
    assert_eq!(resolve("monthly_life"), Some(ReportKind::MonthlyLife));
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(resolve("w"), Some(ReportKind::WeeklyNarrative));
    assert_eq!(resolve("today"), Some(ReportKind::Daily));
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(resolve("fore"), Some(ReportKind::NextWeekForecast));
    assert_eq!(resolve("Ener"), Some(ReportKind::EnergyPatterns));
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("cast");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].kind, ReportKind::NextWeekForecast);
  }

  #[test]
  fn test_no_match() {
    assert_eq!(resolve("zzz"), None);
    assert_eq!(resolve("  "), None);
  }
}
