//! Configuration
//!
//! `PlanConfig` is the validated, immutable input to plan generation. Every
//! field is checked once at construction so the engine never re-validates.
//! `AppConfig` carries process-level settings read from the environment.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::env;

use crate::calendar::{self, SEASON_WEEKS};
use crate::error::ValidationError;

/// ---------------------------------------------------------------------------
/// Defaults and bounds
/// ---------------------------------------------------------------------------

pub const MIN_WEEKLY_HOURS_TARGET: f64 = 8.0;
pub const MAX_WEEKLY_HOURS_TARGET: f64 = 25.0;

pub const DEFAULT_EVALUATION_WEEKS: u32 = 4;
pub const DEFAULT_BASE_PERIOD_WEEKS: u32 = 16;
pub const DEFAULT_SPECIALIZATION_WEEKS: u32 = 16;
pub const DEFAULT_TOURNAMENT_WEEKS: u32 = 12;
pub const DEFAULT_TOPPING_DURATION_WEEKS: u32 = 3;
pub const DEFAULT_TAPERING_DURATION_DAYS: u32 = 7;
pub const DEFAULT_TAPER_FLOOR: f64 = 0.4;
pub const DEFAULT_MAX_SESSIONS_PER_WEEK: u32 = 6;

const MAX_TOPPING_DURATION_WEEKS: u32 = 8;
const MAX_TAPERING_DURATION_DAYS: u32 = 21;

/// ---------------------------------------------------------------------------
/// Plan Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPlanConfig", into = "RawPlanConfig")]
pub struct PlanConfig {
  plan_start_date: NaiveDate,
  plan_end_date: NaiveDate,
  plan_name: Option<String>,
  weekly_hours_target: f64,
  evaluation_weeks: u32,
  base_period_weeks: u32,
  specialization_weeks: u32,
  tournament_weeks: u32,
  topping_duration_weeks_default: u32,
  tapering_duration_days_default: u32,
  taper_floor: f64,
  max_sessions_per_week: u32,
  preferred_training_days: Option<HashSet<Weekday>>,
  exclude_dates: BTreeSet<NaiveDate>,
}

impl PlanConfig {
  pub fn builder(plan_start_date: NaiveDate, weekly_hours_target: f64) -> PlanConfigBuilder {
    PlanConfigBuilder::new(plan_start_date, weekly_hours_target)
  }

  pub fn plan_start_date(&self) -> NaiveDate {
    self.plan_start_date
  }

  /// Exclusive
  pub fn plan_end_date(&self) -> NaiveDate {
    self.plan_end_date
  }

  pub fn plan_name(&self) -> Option<&str> {
    self.plan_name.as_deref()
  }

  pub fn weekly_hours_target(&self) -> f64 {
    self.weekly_hours_target
  }

  /// Size of the Evaluation block reserved at season start
  pub fn evaluation_weeks(&self) -> u32 {
    self.evaluation_weeks
  }

  pub fn base_period_weeks(&self) -> u32 {
    self.base_period_weeks
  }

  pub fn specialization_weeks(&self) -> u32 {
    self.specialization_weeks
  }

  pub fn tournament_weeks(&self) -> u32 {
    self.tournament_weeks
  }

  /// Weeks left to Evaluation once the other blocks are placed
  pub fn remainder_weeks(&self) -> u32 {
    SEASON_WEEKS
      .saturating_sub(self.base_period_weeks)
      .saturating_sub(self.specialization_weeks)
      .saturating_sub(self.tournament_weeks)
  }

  pub fn topping_duration_weeks_default(&self) -> u32 {
    self.topping_duration_weeks_default
  }

  pub fn tapering_duration_days_default(&self) -> u32 {
    self.tapering_duration_days_default
  }

  pub fn taper_floor(&self) -> f64 {
    self.taper_floor
  }

  pub fn max_sessions_per_week(&self) -> u32 {
    self.max_sessions_per_week
  }

  pub fn preferred_training_days(&self) -> Option<&HashSet<Weekday>> {
    self.preferred_training_days.as_ref()
  }

  pub fn exclude_dates(&self) -> &BTreeSet<NaiveDate> {
    &self.exclude_dates
  }

  pub fn is_excluded(&self, date: NaiveDate) -> bool {
    self.exclude_dates.contains(&date)
  }
}

/// ---------------------------------------------------------------------------
/// Builder
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlanConfigBuilder {
  raw: RawPlanConfig,
}

impl PlanConfigBuilder {
  pub fn new(plan_start_date: NaiveDate, weekly_hours_target: f64) -> Self {
    Self {
      raw: RawPlanConfig {
        plan_start_date,
        weekly_hours_target,
        ..RawPlanConfig::default()
      },
    }
  }

  pub fn plan_name(mut self, name: impl Into<String>) -> Self {
    self.raw.plan_name = Some(name.into());
    self
  }

  pub fn evaluation_weeks(mut self, weeks: u32) -> Self {
    self.raw.evaluation_weeks = weeks;
    self
  }

  pub fn base_period_weeks(mut self, weeks: u32) -> Self {
    self.raw.base_period_weeks = weeks;
    self
  }

  pub fn specialization_weeks(mut self, weeks: u32) -> Self {
    self.raw.specialization_weeks = weeks;
    self
  }

  pub fn tournament_weeks(mut self, weeks: u32) -> Self {
    self.raw.tournament_weeks = weeks;
    self
  }

  pub fn topping_duration_weeks_default(mut self, weeks: u32) -> Self {
    self.raw.topping_duration_weeks_default = Some(weeks);
    self
  }

  pub fn tapering_duration_days_default(mut self, days: u32) -> Self {
    self.raw.tapering_duration_days_default = Some(days);
    self
  }

  pub fn taper_floor(mut self, floor: f64) -> Self {
    self.raw.taper_floor = floor;
    self
  }

  pub fn max_sessions_per_week(mut self, sessions: u32) -> Self {
    self.raw.max_sessions_per_week = Some(sessions);
    self
  }

  pub fn preferred_training_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
    self.raw.preferred_training_days = Some(days.into_iter().collect());
    self
  }

  pub fn exclude_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
    self.raw.exclude_dates = dates.into_iter().collect();
    self
  }

  /// Fill topping/tapering/session settings not set explicitly from process settings
  pub fn with_app_defaults(mut self, app: &AppConfig) -> Self {
    self.raw = self.raw.with_app_defaults(app);
    self
  }

  pub fn build(self) -> Result<PlanConfig, ValidationError> {
    PlanConfig::try_from(self.raw)
  }
}

/// ---------------------------------------------------------------------------
/// Raw (wire) form
/// ---------------------------------------------------------------------------

/// Unvalidated mirror of `PlanConfig` as it arrives from a request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlanConfig {
  pub plan_start_date: NaiveDate,
  pub plan_name: Option<String>,
  pub weekly_hours_target: f64,
  pub evaluation_weeks: u32,
  pub base_period_weeks: u32,
  pub specialization_weeks: u32,
  pub tournament_weeks: u32,
  pub topping_duration_weeks_default: Option<u32>,
  pub tapering_duration_days_default: Option<u32>,
  pub taper_floor: f64,
  pub max_sessions_per_week: Option<u32>,
  pub preferred_training_days: Option<Vec<Weekday>>,
  pub exclude_dates: Vec<NaiveDate>,
}

impl RawPlanConfig {
  /// Fill settings the request left out from process settings
  pub fn with_app_defaults(mut self, app: &AppConfig) -> Self {
    self
      .topping_duration_weeks_default
      .get_or_insert(app.topping_duration_weeks_default);
    self
      .tapering_duration_days_default
      .get_or_insert(app.tapering_duration_days_default);
    self.max_sessions_per_week.get_or_insert(app.max_sessions_per_week);
    self
  }
}

impl Default for RawPlanConfig {
  fn default() -> Self {
    Self {
      plan_start_date: NaiveDate::default(),
      plan_name: None,
      weekly_hours_target: 12.0,
      evaluation_weeks: DEFAULT_EVALUATION_WEEKS,
      base_period_weeks: DEFAULT_BASE_PERIOD_WEEKS,
      specialization_weeks: DEFAULT_SPECIALIZATION_WEEKS,
      tournament_weeks: DEFAULT_TOURNAMENT_WEEKS,
      topping_duration_weeks_default: None,
      tapering_duration_days_default: None,
      taper_floor: DEFAULT_TAPER_FLOOR,
      max_sessions_per_week: None,
      preferred_training_days: None,
      exclude_dates: Vec::new(),
    }
  }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
  if value.is_finite() && value >= min && value <= max {
    Ok(())
  } else {
    Err(ValidationError::OutOfRange {
      field,
      min,
      max,
      value,
    })
  }
}

impl TryFrom<RawPlanConfig> for PlanConfig {
  type Error = ValidationError;

  fn try_from(raw: RawPlanConfig) -> Result<Self, Self::Error> {
    let target = raw.weekly_hours_target;
    if !target.is_finite() || !(MIN_WEEKLY_HOURS_TARGET..=MAX_WEEKLY_HOURS_TARGET).contains(&target) {
      return Err(ValidationError::WeeklyHoursOutOfBounds(target));
    }

    let blocks = [raw.base_period_weeks, raw.specialization_weeks, raw.tournament_weeks];
    let requested = blocks
      .iter()
      .try_fold(0u32, |sum, weeks| sum.checked_add(*weeks))
      .filter(|sum| blocks.iter().all(|w| *w <= SEASON_WEEKS) && *sum <= SEASON_WEEKS);
    if requested.is_none() {
      return Err(ValidationError::BlocksExceedSeason {
        requested: blocks.iter().fold(0u32, |sum, weeks| sum.saturating_add(*weeks)),
        available: SEASON_WEEKS,
      });
    }

    check_range(
      "evaluationWeeks",
      raw.evaluation_weeks as f64,
      0.0,
      SEASON_WEEKS as f64,
    )?;
    let topping_duration_weeks_default = raw
      .topping_duration_weeks_default
      .unwrap_or(DEFAULT_TOPPING_DURATION_WEEKS);
    let tapering_duration_days_default = raw
      .tapering_duration_days_default
      .unwrap_or(DEFAULT_TAPERING_DURATION_DAYS);
    let max_sessions_per_week = raw.max_sessions_per_week.unwrap_or(DEFAULT_MAX_SESSIONS_PER_WEEK);

    check_range(
      "toppingDurationWeeksDefault",
      topping_duration_weeks_default as f64,
      1.0,
      MAX_TOPPING_DURATION_WEEKS as f64,
    )?;
    check_range(
      "taperingDurationDaysDefault",
      tapering_duration_days_default as f64,
      1.0,
      MAX_TAPERING_DURATION_DAYS as f64,
    )?;
    check_range("taperFloor", raw.taper_floor, 0.1, 1.0)?;
    check_range("maxSessionsPerWeek", max_sessions_per_week as f64, 1.0, 7.0)?;

    let plan_end_date = calendar::plan_end_date(raw.plan_start_date)
      .ok_or(ValidationError::StartDateOutOfRange(raw.plan_start_date))?;

    let preferred_training_days = match raw.preferred_training_days {
      Some(days) => {
        let days: HashSet<Weekday> = days.into_iter().collect();
        if days.len() >= 7 {
          return Err(ValidationError::NoRestDayAvailable);
        }
        if days.is_empty() {
          None
        } else {
          Some(days)
        }
      }
      None => None,
    };

    let plan_name = raw
      .plan_name
      .map(|n| n.trim().to_string())
      .filter(|n| !n.is_empty());

    Ok(Self {
      plan_start_date: raw.plan_start_date,
      plan_end_date,
      plan_name,
      weekly_hours_target: target,
      evaluation_weeks: raw.evaluation_weeks,
      base_period_weeks: raw.base_period_weeks,
      specialization_weeks: raw.specialization_weeks,
      tournament_weeks: raw.tournament_weeks,
      topping_duration_weeks_default,
      tapering_duration_days_default,
      taper_floor: raw.taper_floor,
      max_sessions_per_week,
      preferred_training_days,
      exclude_dates: raw.exclude_dates.into_iter().collect(),
    })
  }
}

impl From<PlanConfig> for RawPlanConfig {
  fn from(config: PlanConfig) -> Self {
    Self {
      plan_start_date: config.plan_start_date,
      plan_name: config.plan_name,
      weekly_hours_target: config.weekly_hours_target,
      evaluation_weeks: config.evaluation_weeks,
      base_period_weeks: config.base_period_weeks,
      specialization_weeks: config.specialization_weeks,
      tournament_weeks: config.tournament_weeks,
      topping_duration_weeks_default: Some(config.topping_duration_weeks_default),
      tapering_duration_days_default: Some(config.tapering_duration_days_default),
      taper_floor: config.taper_floor,
      max_sessions_per_week: Some(config.max_sessions_per_week),
      preferred_training_days: config.preferred_training_days.map(|days| {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days
      }),
      exclude_dates: config.exclude_dates.into_iter().collect(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// App Config (environment)
/// ---------------------------------------------------------------------------

pub const DEFAULT_DATABASE_URL: &str = "sqlite://annual-plan.db?mode=rwc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Pretty,
  Compact,
  Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
  pub log_format: LogFormat,
  pub topping_duration_weeks_default: u32,
  pub tapering_duration_days_default: u32,
  pub max_sessions_per_week: u32,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value}")]
  InvalidValue { name: &'static str, value: String },
}

fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
  match env::var(name) {
    Ok(value) => value
      .trim()
      .parse()
      .map_err(|_| ConfigError::InvalidValue { name, value }),
    Err(_) => Ok(default),
  }
}

impl AppConfig {
  /// Read settings from the process environment (after `.env` is loaded)
  pub fn from_env() -> Result<Self, ConfigError> {
    let log_format = match env::var("LOG_FORMAT").as_deref() {
      Ok("json") => LogFormat::Json,
      Ok("compact") => LogFormat::Compact,
      _ => LogFormat::Pretty,
    };

    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
      log_format,
      topping_duration_weeks_default: env_u32(
        "PLAN_TOPPING_WEEKS",
        DEFAULT_TOPPING_DURATION_WEEKS,
      )?,
      tapering_duration_days_default: env_u32(
        "PLAN_TAPERING_DAYS",
        DEFAULT_TAPERING_DURATION_DAYS,
      )?,
      max_sessions_per_week: env_u32("PLAN_MAX_SESSIONS_PER_WEEK", DEFAULT_MAX_SESSIONS_PER_WEEK)?,
    })
  }
}
