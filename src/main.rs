use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval};

use insights::commands::{self, REPORTS};
use insights::config::Config;
use insights::insights::{
  DailyInsight, EnergyPatterns, HealthInsights, HttpInsightService, IsoWeek, MonthlyLifeReport,
  NextWeekForecast, PatternIntelligence, Report, ReportKind, SimilarWeek, WeeklyNarrative, Window,
};
use insights::{logging, InsightOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "insights")]
#[command(about = "Fetch and follow AI insight reports")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/insights/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List report names and aliases
  Kinds,
  /// Fetch a report once and print its settled state as JSON
  Show {
    /// Report name or alias, e.g. "weekly" or "w"
    report: String,
    /// Date, ISO week or window, depending on the report
    key: Option<String>,
  },
  /// Follow a report, printing every state change as a JSON line
  Watch {
    report: String,
    key: Option<String>,
    /// Refresh periodically, bypassing the cache
    #[arg(long, value_name = "SECS")]
    refresh_every: Option<u64>,
  },
}

/// Runs `$run::<Report>($args)` for the report type behind a kind.
macro_rules! for_report {
  ($kind:expr, $run:ident($($arg:expr),*)) => {
    match $kind {
      ReportKind::Daily => $run::<DailyInsight>($($arg),*).await,
      ReportKind::WeeklyNarrative => $run::<WeeklyNarrative>($($arg),*).await,
      ReportKind::NextWeekForecast => $run::<NextWeekForecast>($($arg),*).await,
      ReportKind::PatternIntelligence => $run::<PatternIntelligence>($($arg),*).await,
      ReportKind::MonthlyLife => $run::<MonthlyLifeReport>($($arg),*).await,
      ReportKind::EnergyPatterns => $run::<EnergyPatterns>($($arg),*).await,
      ReportKind::SimilarWeek => $run::<SimilarWeek>($($arg),*).await,
      ReportKind::HealthInsights => $run::<HealthInsights>($($arg),*).await,
    }
  };
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  if let Command::Kinds = args.command {
    print_kinds();
    return Ok(());
  }

  let config = Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config.log)?;

  let service = HttpInsightService::new(&config.service)?;
  let orchestrator = InsightOrchestrator::new(Arc::new(service), config.cache.clone());

  match args.command {
    Command::Kinds => Ok(()),
    Command::Show { report, key } => {
      let kind = resolve(&report)?;
      for_report!(kind, show(&orchestrator, key.as_deref()))
    }
    Command::Watch {
      report,
      key,
      refresh_every,
    } => {
      let kind = resolve(&report)?;
      for_report!(kind, watch(&orchestrator, key.as_deref(), refresh_every))
    }
  }
}

/// Selection keys as typed on the command line.
trait CliKey: Sized {
  fn default_for(kind: ReportKind, today: NaiveDate) -> Self;
  fn parse_arg(raw: &str) -> Result<Self>;
}

impl CliKey for NaiveDate {
  fn default_for(_kind: ReportKind, today: NaiveDate) -> Self {
    today
  }

  fn parse_arg(raw: &str) -> Result<Self> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| eyre!("Invalid date {:?}: {}", raw, e))
  }
}

impl CliKey for IsoWeek {
  fn default_for(kind: ReportKind, today: NaiveDate) -> Self {
    let week = IsoWeek::containing(today);
    if kind == ReportKind::NextWeekForecast {
      week.next()
    } else {
      week
    }
  }

  fn parse_arg(raw: &str) -> Result<Self> {
    Ok(raw.parse()?)
  }
}

impl CliKey for Window {
  fn default_for(_kind: ReportKind, _today: NaiveDate) -> Self {
    Window::default()
  }

  fn parse_arg(raw: &str) -> Result<Self> {
    Ok(raw.parse()?)
  }
}

impl CliKey for () {
  fn default_for(_kind: ReportKind, _today: NaiveDate) -> Self {}

  fn parse_arg(raw: &str) -> Result<Self> {
    Err(eyre!("This report takes no key, got {:?}", raw))
  }
}

fn resolve(report: &str) -> Result<ReportKind> {
  commands::resolve(report)
    .ok_or_else(|| eyre!("Unknown report {:?}. Run `insights kinds` to list reports.", report))
}

fn parse_key<K: CliKey>(kind: ReportKind, raw: Option<&str>) -> Result<K> {
  match raw {
    Some(raw) => K::parse_arg(raw),
    None => Ok(K::default_for(kind, Local::now().date_naive())),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string(value)?);
  Ok(())
}

fn print_kinds() {
  for report in REPORTS {
    println!(
      "{:<10} {:<28} {:<10} {}",
      report.name,
      report.aliases.join(", "),
      report.key_hint,
      report.description
    );
  }
}

async fn show<R: Report>(orchestrator: &InsightOrchestrator, raw_key: Option<&str>) -> Result<()>
where
  R::Key: CliKey,
{
  let key = parse_key::<R::Key>(R::KIND, raw_key)?;
  let mut sub = orchestrator.observe::<R>(&key);
  orchestrator.select::<R>(key);

  loop {
    let state = sub.latest();
    if state.is_loaded() || state.is_failed() {
      print_json(&state)?;
      return match state.error() {
        Some(err) => Err(eyre!("Failed to fetch {}: {}", R::KIND, err)),
        None => Ok(()),
      };
    }
    if sub.changed().await.is_none() {
      return Err(eyre!("Subscription for {} ended", R::KIND));
    }
  }
}

async fn watch<R: Report>(
  orchestrator: &InsightOrchestrator,
  raw_key: Option<&str>,
  refresh_every: Option<u64>,
) -> Result<()>
where
  R::Key: CliKey,
{
  let key = parse_key::<R::Key>(R::KIND, raw_key)?;
  let mut active = orchestrator.observe_active::<R>();
  orchestrator.select::<R>(key.clone());
  print_json(&active.latest())?;

  let mut ticker = refresh_every.map(|secs| {
    let period = Duration::from_secs(secs.max(1));
    interval_at(Instant::now() + period, period)
  });

  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  loop {
    tokio::select! {
      _ = &mut ctrl_c => {
        orchestrator.dispose(R::KIND);
        return Ok(());
      }
      state = active.changed() => match state {
        Some(state) => print_json(&state)?,
        None => return Ok(()),
      },
      _ = tick(&mut ticker) => {
        orchestrator.refresh::<R>(key.clone());
      }
    }
  }
}

async fn tick(ticker: &mut Option<Interval>) {
  match ticker {
    Some(ticker) => {
      ticker.tick().await;
    }
    None => std::future::pending().await,
  }
}
