//! Plan Assembler
//!
//! Runs the scheduler, allocator, progression curve and decomposer in order,
//! then checks every plan invariant before handing back a result. Generation
//! is all-or-nothing: any validation failure or invariant violation returns an
//! error and no partial plan.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::calendar::{self, SEASON_WEEKS};
use crate::config::PlanConfig;
use crate::daily::DailyDecomposer;
use crate::error::{GenerationError, InvariantViolation, PlanWarning, ValidationError};
use crate::models::{
  priorities_for, AnnualTrainingPlan, Category, DailyAssignment, Period, Periodization,
  PlanStatus, PlayerBaseline, ScheduledTournament, TournamentInput,
};
use crate::periods::PeriodAllocator;
use crate::progression::{self, ProgressionCurve};
use crate::tournament::TournamentScheduler;

/// Weekly session minutes may drift this far from the week's hours
pub const HOUR_TOLERANCE: f64 = 0.25;

/// Season average must sit in this band, as a share of the target. Weeks
/// inside a peaking window lower the floor in proportion to the taper floor.
pub const SEASON_AVERAGE_BAND: (f64, f64) = (0.4, 1.0);

/// Half of the 0.1h rounding step applied to weekly hours
const HOURS_ROUNDING_SLACK: f64 = 0.05;

/// ---------------------------------------------------------------------------
/// Stages
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
  CollectingInputs,
  AllocatingPeriods,
  ComputingProgression,
  DecomposingDays,
  Validating,
  Committed,
  Rejected,
}

/// ---------------------------------------------------------------------------
/// Result
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
  pub plan: AnnualTrainingPlan,
  pub periodizations: Vec<Periodization>,
  pub daily_assignments: Vec<DailyAssignment>,
  pub tournaments: Vec<ScheduledTournament>,
  pub warnings: Vec<PlanWarning>,
}

impl PlanResult {
  pub fn week(&self, week_number: u32) -> Option<&Periodization> {
    week_number
      .checked_sub(1)
      .and_then(|i| self.periodizations.get(i as usize))
  }

  pub fn days_of_week(&self, week_number: u32) -> impl Iterator<Item = &DailyAssignment> {
    self
      .daily_assignments
      .iter()
      .filter(move |d| d.week_number == week_number)
  }

  pub fn period_count(&self, period: Period) -> u32 {
    self.periodizations.iter().filter(|p| p.period == period).count() as u32
  }
}

/// ---------------------------------------------------------------------------
/// Input checks
/// ---------------------------------------------------------------------------

fn check_optional(field: &'static str, value: Option<f64>, min: f64, max: f64) -> Result<(), ValidationError> {
  match value {
    Some(v) if !(v.is_finite() && v >= min && v <= max) => Err(ValidationError::OutOfRange {
      field,
      min,
      max,
      value: v,
    }),
    _ => Ok(()),
  }
}

pub fn validate_baseline(baseline: &PlayerBaseline) -> Result<(), ValidationError> {
  if baseline.player_id.trim().is_empty() {
    return Err(ValidationError::PlayerIdMissing);
  }
  check_optional("averageScore", Some(baseline.average_score), 50.0, 150.0)?;
  check_optional("handicap", baseline.handicap, -10.0, 54.0)?;
  check_optional("driverSpeed", baseline.driver_speed, 40.0, 150.0)?;
  Ok(())
}

pub fn validate_target(category: Category, config: &PlanConfig) -> Result<(), ValidationError> {
  let (min, max) = category.weekly_hours_range();
  let target = config.weekly_hours_target();
  if target < min || target > max {
    return Err(ValidationError::TargetOutsideCategory {
      target,
      category: category.to_string(),
      min,
      max,
    });
  }
  Ok(())
}

/// Default plan name, e.g. "78 avg - 12-month plan"
pub fn default_plan_name(average_score: f64) -> String {
  format!("{} avg - 12-month plan", average_score)
}

/// ---------------------------------------------------------------------------
/// Assembler
/// ---------------------------------------------------------------------------

pub struct PlanAssembler<'a> {
  config: &'a PlanConfig,
  stage: GenerationStage,
}

impl<'a> PlanAssembler<'a> {
  pub fn new(config: &'a PlanConfig) -> Self {
    Self {
      config,
      stage: GenerationStage::CollectingInputs,
    }
  }

  pub fn stage(&self) -> GenerationStage {
    self.stage
  }

  fn enter(&mut self, stage: GenerationStage) {
    debug!(from = ?self.stage, to = ?stage, "generation stage");
    self.stage = stage;
  }

  pub fn assemble(
    &mut self,
    baseline: &PlayerBaseline,
    category: Category,
    tournaments: &[TournamentInput],
  ) -> Result<PlanResult, GenerationError> {
    match self.run(baseline, category, tournaments) {
      Ok(result) => {
        self.enter(GenerationStage::Committed);
        Ok(result)
      }
      Err(e) => {
        self.enter(GenerationStage::Rejected);
        warn!(code = e.code(), error = %e, "plan generation rejected");
        Err(e)
      }
    }
  }

  fn run(
    &mut self,
    baseline: &PlayerBaseline,
    category: Category,
    tournaments: &[TournamentInput],
  ) -> Result<PlanResult, GenerationError> {
    let config = self.config;

    validate_baseline(baseline)?;
    validate_target(category, config)?;
    let schedule = TournamentScheduler::new(config).schedule(tournaments)?;
    let mut warnings = schedule.warnings;

    self.enter(GenerationStage::AllocatingPeriods);
    let allocation = PeriodAllocator::new(config).allocate(&schedule.tournaments);
    warnings.extend(allocation.warnings.iter().cloned());

    self.enter(GenerationStage::ComputingProgression);
    let curve = ProgressionCurve::new(config.weekly_hours_target(), config.taper_floor(), category)
      .compute(allocation.periods(), &schedule.tournaments);

    let plan_start = config.plan_start_date();
    let plan_end = config.plan_end_date();
    let periodizations: Vec<Periodization> = curve
      .into_iter()
      .map(|week| {
        let (start_date, end_date) = calendar::week_bounds(plan_start, plan_end, week.week_number);
        Periodization {
          week_number: week.week_number,
          start_date,
          end_date,
          period: week.period,
          week_in_period: week.week_in_period,
          learning_phase: week.learning_phase,
          setting: week.setting,
          intensity: week.intensity,
          weekly_hours: week.weekly_hours,
          priorities: priorities_for(week.period).to_vec(),
        }
      })
      .collect();

    self.enter(GenerationStage::DecomposingDays);
    let daily_assignments =
      DailyDecomposer::new(config, &schedule.tournaments).decompose(&periodizations)?;

    let plan = AnnualTrainingPlan {
      player_id: baseline.player_id.clone(),
      plan_name: config
        .plan_name()
        .map(str::to_string)
        .unwrap_or_else(|| default_plan_name(baseline.average_score)),
      start_date: plan_start,
      end_date: plan_end,
      status: PlanStatus::Draft,
      baseline_average_score: baseline.average_score,
      baseline_handicap: baseline.handicap,
      baseline_driver_speed: baseline.driver_speed,
      category,
      weekly_hours_target: config.weekly_hours_target(),
      evaluation_weeks: config.remainder_weeks(),
      base_period_weeks: config.base_period_weeks(),
      specialization_weeks: config.specialization_weeks(),
      tournament_weeks: config.tournament_weeks(),
    };

    let result = PlanResult {
      plan,
      periodizations,
      daily_assignments,
      tournaments: schedule.tournaments,
      warnings,
    };

    self.enter(GenerationStage::Validating);
    validate_plan(&result, config)?;

    for warning in &result.warnings {
      warn!(code = warning.code(), "{}", warning);
    }
    info!(
      player_id = %result.plan.player_id,
      weeks = result.periodizations.len(),
      days = result.daily_assignments.len(),
      warnings = result.warnings.len(),
      "generated annual plan"
    );

    Ok(result)
  }
}

/// Build a validated annual plan for one player
pub fn generate(
  baseline: &PlayerBaseline,
  category: Category,
  tournaments: &[TournamentInput],
  config: &PlanConfig,
) -> Result<PlanResult, GenerationError> {
  PlanAssembler::new(config).assemble(baseline, category, tournaments)
}

/// ---------------------------------------------------------------------------
/// Invariants
/// ---------------------------------------------------------------------------

/// Check every structural invariant of a generated plan
pub fn validate_plan(result: &PlanResult, config: &PlanConfig) -> Result<(), InvariantViolation> {
  validate_weeks(result, config)?;
  validate_days(result, config)?;
  validate_period_counts(result, config)?;
  validate_progression(&result.periodizations)?;
  validate_taper(result)?;
  validate_season_average(result, config)?;
  Ok(())
}

fn validate_weeks(result: &PlanResult, config: &PlanConfig) -> Result<(), InvariantViolation> {
  let weeks = &result.periodizations;
  if weeks.len() != SEASON_WEEKS as usize {
    return Err(InvariantViolation::WeekCount {
      expected: SEASON_WEEKS,
      found: weeks.len(),
    });
  }

  let mut cursor = config.plan_start_date();
  for (i, week) in weeks.iter().enumerate() {
    if week.week_number != i as u32 + 1 {
      return Err(InvariantViolation::WeekSequence {
        week: week.week_number,
      });
    }
    if week.start_date != cursor || week.end_date <= week.start_date {
      return Err(InvariantViolation::WeekBoundary {
        week: week.week_number,
      });
    }
    cursor = week.end_date;
  }
  if cursor != config.plan_end_date() {
    return Err(InvariantViolation::WeekBoundary { week: SEASON_WEEKS });
  }
  Ok(())
}

fn validate_days(result: &PlanResult, config: &PlanConfig) -> Result<(), InvariantViolation> {
  let start = config.plan_start_date();
  let end = config.plan_end_date();
  let expected = calendar::plan_length_days(start, end);
  let days = &result.daily_assignments;
  if days.len() as i64 != expected {
    return Err(InvariantViolation::DayCount {
      expected,
      found: days.len(),
    });
  }

  let mut minutes: BTreeMap<u32, u32> = BTreeMap::new();
  let mut has_rest: BTreeMap<u32, bool> = BTreeMap::new();

  for (date, day) in start.iter_days().zip(days.iter()) {
    if day.assigned_date != date {
      return Err(InvariantViolation::DaySequence { date });
    }
    let owner = calendar::week_of(start, end, date).unwrap_or(0);
    if day.week_number != owner {
      return Err(InvariantViolation::DayWeekMismatch {
        date,
        expected: owner,
        found: day.week_number,
      });
    }
    if day.is_rest_day {
      if day.session_type.is_some() || day.estimated_duration != 0 {
        return Err(InvariantViolation::DayShape {
          date,
          reason: "rest day carries a session",
        });
      }
    } else if day.session_type.is_none() || day.estimated_duration == 0 {
      return Err(InvariantViolation::DayShape {
        date,
        reason: "training day without a session",
      });
    }

    *minutes.entry(day.week_number).or_default() += day.estimated_duration;
    *has_rest.entry(day.week_number).or_default() |= day.is_rest_day;
  }

  for week in &result.periodizations {
    if !has_rest.get(&week.week_number).copied().unwrap_or(false) {
      return Err(InvariantViolation::MissingRestDay {
        week: week.week_number,
      });
    }
    let actual_hours = minutes.get(&week.week_number).copied().unwrap_or(0) as f64 / 60.0;
    if (actual_hours - week.weekly_hours).abs() > HOUR_TOLERANCE {
      return Err(InvariantViolation::HourBudgetDrift {
        week: week.week_number,
        budget_hours: week.weekly_hours,
        actual_hours,
      });
    }
  }
  Ok(())
}

fn validate_period_counts(result: &PlanResult, config: &PlanConfig) -> Result<(), InvariantViolation> {
  let expected = [
    (Period::Evaluation, config.remainder_weeks()),
    (Period::Base, config.base_period_weeks()),
    (Period::Specialization, config.specialization_weeks()),
    (Period::Tournament, config.tournament_weeks()),
  ];
  for (period, expected) in expected {
    let found = result.period_count(period);
    if found != expected {
      return Err(InvariantViolation::PeriodCount {
        period,
        expected,
        found,
      });
    }
  }
  Ok(())
}

fn validate_progression(weeks: &[Periodization]) -> Result<(), InvariantViolation> {
  for (i, week) in weeks.iter().enumerate() {
    let (phase_min, phase_max) = progression::learning_phase_band(week.period);
    if week.learning_phase < phase_min || week.learning_phase > phase_max {
      return Err(InvariantViolation::ProgressionOutOfBand {
        week: week.week_number,
        period: week.period,
        field: "learning_phase",
      });
    }
    let (setting_min, setting_max) = progression::setting_band(week.period);
    if week.setting < setting_min || week.setting > setting_max {
      return Err(InvariantViolation::ProgressionOutOfBand {
        week: week.week_number,
        period: week.period,
        field: "setting",
      });
    }

    let Some(prev) = i.checked_sub(1).and_then(|p| weeks.get(p)) else {
      continue;
    };
    if prev.period != week.period {
      continue;
    }
    if week.learning_phase < prev.learning_phase {
      return Err(InvariantViolation::ProgressionRegressed {
        week: week.week_number,
        period: week.period,
        field: "learning_phase",
      });
    }
    if week.setting < prev.setting {
      return Err(InvariantViolation::ProgressionRegressed {
        week: week.week_number,
        period: week.period,
        field: "setting",
      });
    }
  }
  Ok(())
}

fn validate_taper(result: &PlanResult) -> Result<(), InvariantViolation> {
  for tournament in &result.tournaments {
    let Some((start, end)) = tournament.taper_window() else {
      continue;
    };
    for week in (start + 1)..=end {
      let (Some(prev), Some(current)) = (result.week(week - 1), result.week(week)) else {
        continue;
      };
      if current.weekly_hours > prev.weekly_hours {
        return Err(InvariantViolation::TaperNotMonotone {
          tournament: tournament.name.clone(),
          from_week: week - 1,
          to_week: week,
        });
      }
    }
  }
  Ok(())
}

/// Lower and upper bound on the season average for this plan's windows
pub fn season_average_bounds(result: &PlanResult, config: &PlanConfig) -> (f64, f64) {
  let target = config.weekly_hours_target();
  let weeks = result.periodizations.len().max(1) as f64;
  let tapered = result
    .periodizations
    .iter()
    .filter(|w| {
      result
        .tournaments
        .iter()
        .filter_map(|t| t.taper_window())
        .any(|(start, end)| w.week_number >= start && w.week_number <= end)
    })
    .count() as f64;

  let share = (weeks - tapered + tapered * config.taper_floor()) / weeks;
  (
    target * SEASON_AVERAGE_BAND.0 * share,
    target * SEASON_AVERAGE_BAND.1 + HOURS_ROUNDING_SLACK,
  )
}

fn validate_season_average(result: &PlanResult, config: &PlanConfig) -> Result<(), InvariantViolation> {
  let weeks = &result.periodizations;
  let average = weeks.iter().map(|w| w.weekly_hours).sum::<f64>() / weeks.len().max(1) as f64;
  let (min, max) = season_average_bounds(result, config);
  if average < min || average > max {
    return Err(InvariantViolation::SeasonAverageDrift { average, min, max });
  }
  Ok(())
}
