//! Error and warning types surfaced by plan generation
//!
//! Validation errors reject input before any computation runs. Invariant
//! violations mean the engine produced an inconsistent plan and generation
//! fails closed. Scheduling conflicts are resolved deterministically and
//! reported next to a successful result as warnings.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::Period;

/// ---------------------------------------------------------------------------
/// Validation Errors
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ValidationError {
  #[error("weeklyHoursTarget {0} is outside [8, 25]")]
  WeeklyHoursOutOfBounds(f64),

  #[error("weeklyHoursTarget {target} is outside category {category} range [{min}, {max}]")]
  TargetOutsideCategory {
    target: f64,
    category: String,
    min: f64,
    max: f64,
  },

  #[error("block sizes need {requested} weeks but the season has {available}")]
  BlocksExceedSeason { requested: u32, available: u32 },

  #[error("{field} must be within [{min}, {max}], got {value}")]
  OutOfRange {
    field: &'static str,
    min: f64,
    max: f64,
    value: f64,
  },

  #[error("tournament '{name}' on {date} is outside the plan range [{plan_start}, {plan_end})")]
  TournamentOutOfRange {
    name: String,
    date: NaiveDate,
    plan_start: NaiveDate,
    plan_end: NaiveDate,
  },

  #[error("tournament '{name}' ends before it starts")]
  TournamentDatesInverted { name: String },

  #[error("tournament name must not be empty")]
  TournamentNameMissing,

  #[error("playerId must not be empty")]
  PlayerIdMissing,

  #[error("preferred training days must leave at least one rest day")]
  NoRestDayAvailable,

  #[error("week {week} has no training day left after exclusions")]
  WeekFullyExcluded { week: u32 },

  #[error("plan start date {0} is too late to build a twelve-month season")]
  StartDateOutOfRange(NaiveDate),
}

impl ValidationError {
  /// Stable machine-readable code for request handlers
  pub fn code(&self) -> &'static str {
    match self {
      ValidationError::WeeklyHoursOutOfBounds(_) => "WEEKLY_HOURS_OUT_OF_BOUNDS",
      ValidationError::TargetOutsideCategory { .. } => "TARGET_OUTSIDE_CATEGORY",
      ValidationError::BlocksExceedSeason { .. } => "BLOCKS_EXCEED_SEASON",
      ValidationError::OutOfRange { .. } => "VALUE_OUT_OF_RANGE",
      ValidationError::TournamentOutOfRange { .. } => "TOURNAMENT_OUT_OF_RANGE",
      ValidationError::TournamentDatesInverted { .. } => "TOURNAMENT_DATES_INVERTED",
      ValidationError::TournamentNameMissing => "TOURNAMENT_NAME_MISSING",
      ValidationError::PlayerIdMissing => "PLAYER_ID_MISSING",
      ValidationError::NoRestDayAvailable => "NO_REST_DAY_AVAILABLE",
      ValidationError::WeekFullyExcluded { .. } => "WEEK_FULLY_EXCLUDED",
      ValidationError::StartDateOutOfRange(_) => "START_DATE_OUT_OF_RANGE",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Invariant Violations
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum InvariantViolation {
  #[error("expected {expected} periodization weeks, found {found}")]
  WeekCount { expected: u32, found: usize },

  #[error("week {week} breaks the contiguous 1..52 sequence")]
  WeekSequence { week: u32 },

  #[error("week {week} does not abut the previous week")]
  WeekBoundary { week: u32 },

  #[error("expected {expected} daily assignments, found {found}")]
  DayCount { expected: i64, found: usize },

  #[error("daily assignment for {date} is missing, duplicated or out of order")]
  DaySequence { date: NaiveDate },

  #[error("daily assignment for {date} points at week {found}, expected {expected}")]
  DayWeekMismatch {
    date: NaiveDate,
    expected: u32,
    found: u32,
  },

  #[error("assignment on {date} is inconsistent: {reason}")]
  DayShape { date: NaiveDate, reason: &'static str },

  #[error("week {week} has no rest day")]
  MissingRestDay { week: u32 },

  #[error("week {week} sums to {actual_hours:.2}h against a budget of {budget_hours:.2}h")]
  HourBudgetDrift {
    week: u32,
    budget_hours: f64,
    actual_hours: f64,
  },

  #[error("{period} has {found} weeks, configured {expected}")]
  PeriodCount {
    period: Period,
    expected: u32,
    found: u32,
  },

  #[error("week {week} {field} decreases inside a {period} block")]
  ProgressionRegressed {
    week: u32,
    period: Period,
    field: &'static str,
  },

  #[error("week {week} {field} lies outside the {period} band")]
  ProgressionOutOfBand {
    week: u32,
    period: Period,
    field: &'static str,
  },

  #[error("weekly hours rise from week {from_week} to {to_week} inside the taper for '{tournament}'")]
  TaperNotMonotone {
    tournament: String,
    from_week: u32,
    to_week: u32,
  },

  #[error("season average {average:.2}h is outside [{min:.2}, {max:.2}]")]
  SeasonAverageDrift { average: f64, min: f64, max: f64 },
}

/// ---------------------------------------------------------------------------
/// Generation Error
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum GenerationError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("Invariant violation: {0}")]
  Invariant(#[from] InvariantViolation),
}

impl GenerationError {
  pub fn code(&self) -> &'static str {
    match self {
      GenerationError::Validation(e) => e.code(),
      GenerationError::Invariant(_) => "INVARIANT_VIOLATION",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Scheduling conflicts (non-fatal)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanWarning {
  /// Topping window would start before week 1
  ToppingClamped {
    tournament: String,
    requested_start_week: i64,
  },
  /// Topping window clipped to start after an earlier A-tournament
  ToppingClipped {
    tournament: String,
    earlier_tournament: String,
    requested_start_week: u32,
    clipped_start_week: u32,
  },
  /// Tapering days would begin before the plan starts
  TaperingClamped {
    tournament: String,
    requested_days: u32,
    effective_days: u32,
  },
  /// More topping weeks than the tournament-week budget allows
  TournamentWeeksTruncated {
    candidates: u32,
    budget: u32,
    discarded_weeks: Vec<u32>,
  },
}

impl PlanWarning {
  pub fn code(&self) -> &'static str {
    match self {
      PlanWarning::ToppingClamped { .. } => "TOPPING_CLAMPED",
      PlanWarning::ToppingClipped { .. } => "TOPPING_CLIPPED",
      PlanWarning::TaperingClamped { .. } => "TAPERING_CLAMPED",
      PlanWarning::TournamentWeeksTruncated { .. } => "TOURNAMENT_WEEKS_TRUNCATED",
    }
  }
}

impl std::fmt::Display for PlanWarning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PlanWarning::ToppingClamped {
        tournament,
        requested_start_week,
      } => write!(
        f,
        "topping for '{}' would start in week {}, clamped to week 1",
        tournament, requested_start_week
      ),
      PlanWarning::ToppingClipped {
        tournament,
        earlier_tournament,
        requested_start_week,
        clipped_start_week,
      } => write!(
        f,
        "topping for '{}' clipped from week {} to week {} after '{}'",
        tournament, requested_start_week, clipped_start_week, earlier_tournament
      ),
      PlanWarning::TaperingClamped {
        tournament,
        requested_days,
        effective_days,
      } => write!(
        f,
        "tapering for '{}' shortened from {} to {} days at season start",
        tournament, requested_days, effective_days
      ),
      PlanWarning::TournamentWeeksTruncated {
        candidates,
        budget,
        discarded_weeks,
      } => write!(
        f,
        "{} tournament candidate weeks exceed the budget of {}; dropped weeks {:?}",
        candidates, budget, discarded_weeks
      ),
    }
  }
}
