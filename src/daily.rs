//! Daily Decomposer
//!
//! Turns one week's period, intensity and hour budget into one assignment
//! per calendar day. Rest days are fixed first; the remaining budget is split
//! across training days by priority weight, rounded to 5 minutes, with the
//! rounding drift absorbed by the longest sessions so the week sums exactly
//! to its budget.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use tracing::debug;

use crate::calendar;
use crate::config::PlanConfig;
use crate::error::ValidationError;
use crate::models::{
  DailyAssignment, IntensityBand, Periodization, Priority, ScheduledTournament, SessionType,
};

/// Sessions are scheduled in 5-minute slots
pub const SLOT_MINUTES: u32 = 5;

/// Weekly budgets under this many minutes become short optional sessions
pub const LIGHT_WEEK_MINUTES: u32 = 180;

/// Weekly hours converted to minutes, rounded to the nearest slot
pub fn budget_minutes(weekly_hours: f64) -> u32 {
  let slots = (weekly_hours * 60.0 / SLOT_MINUTES as f64).round();
  if slots <= 0.0 {
    0
  } else {
    slots as u32 * SLOT_MINUTES
  }
}

fn round_to_slot(minutes: f64) -> i64 {
  (minutes / SLOT_MINUTES as f64).round() as i64 * SLOT_MINUTES as i64
}

/// Rest weekdays for a week's intensity, before preferences and exclusions
pub fn rest_weekdays(intensity: IntensityBand, tapering: bool) -> HashSet<Weekday> {
  if tapering {
    return [Weekday::Sun, Weekday::Wed, Weekday::Fri].into_iter().collect();
  }
  match intensity {
    IntensityBand::Peak | IntensityBand::High => [Weekday::Sun].into_iter().collect(),
    IntensityBand::Medium | IntensityBand::Low => [Weekday::Sun, Weekday::Wed].into_iter().collect(),
    IntensityBand::Taper => [Weekday::Sun, Weekday::Wed, Weekday::Fri].into_iter().collect(),
  }
}

/// Session type per training day: the heaviest priority still under its
/// fair share of the week's days
pub fn assign_session_types(priorities: &[Priority], training_days: usize) -> Vec<Priority> {
  let mut counts = vec![0usize; priorities.len()];
  let mut assigned = Vec::with_capacity(training_days);

  for _ in 0..training_days {
    let pick = priorities
      .iter()
      .enumerate()
      .find(|(i, p)| counts[*i] * 100 < p.weight as usize * training_days)
      .map(|(i, _)| i)
      .unwrap_or(0);
    if let Some(priority) = priorities.get(pick) {
      counts[pick] += 1;
      assigned.push(*priority);
    }
  }

  assigned
}

/// Split `budget` across sessions in proportion to `weights`. Every session
/// gets at least one slot and the result sums exactly to `budget` as long as
/// `budget >= SLOT_MINUTES * weights.len()`.
pub fn split_minutes(budget: u32, weights: &[u8]) -> Vec<u32> {
  let total_weight: u32 = weights.iter().map(|w| *w as u32).sum();
  if weights.is_empty() || total_weight == 0 {
    return vec![0; weights.len()];
  }

  let mut minutes: Vec<i64> = weights
    .iter()
    .map(|w| round_to_slot(budget as f64 * *w as f64 / total_weight as f64).max(SLOT_MINUTES as i64))
    .collect();

  // Longest first; earlier day wins a tie
  let mut order: Vec<usize> = (0..minutes.len()).collect();
  order.sort_by_key(|i| (std::cmp::Reverse(minutes[*i]), *i));

  let mut drift = budget as i64 - minutes.iter().sum::<i64>();
  for i in order {
    if drift == 0 {
      break;
    }
    let adjusted = (minutes[i] + drift).max(SLOT_MINUTES as i64);
    drift -= adjusted - minutes[i];
    minutes[i] = adjusted;
  }

  minutes.into_iter().map(|m| m as u32).collect()
}

/// Equal split for light weeks. Days past the budget's slot count get 0.
pub fn split_evenly(budget: u32, days: usize) -> Vec<u32> {
  if days == 0 {
    return Vec::new();
  }
  let slots = budget / SLOT_MINUTES;
  let per_day = slots / days as u32;
  let extra = slots % days as u32;
  (0..days as u32)
    .map(|i| (per_day + u32::from(i < extra)) * SLOT_MINUTES)
    .collect()
}

pub struct DailyDecomposer<'a> {
  config: &'a PlanConfig,
  tournaments: &'a [ScheduledTournament],
}

impl<'a> DailyDecomposer<'a> {
  pub fn new(config: &'a PlanConfig, tournaments: &'a [ScheduledTournament]) -> Self {
    Self { config, tournaments }
  }

  fn is_tapering_day(&self, date: NaiveDate) -> bool {
    self
      .tournaments
      .iter()
      .filter(|t| t.is_peaking_target())
      .any(|t| t.is_tapering_day(date))
  }

  /// `taper_rest` adds Wednesday and Friday to the player's own rest days
  fn is_rest_day(&self, date: NaiveDate, rest: &HashSet<Weekday>, taper_rest: bool) -> bool {
    if self.config.is_excluded(date) {
      return true;
    }
    let weekday = date.weekday();
    match self.config.preferred_training_days() {
      Some(preferred) => {
        !preferred.contains(&weekday) || (taper_rest && matches!(weekday, Weekday::Wed | Weekday::Fri))
      }
      None => rest.contains(&weekday),
    }
  }

  fn rest_flags(&self, dates: &[NaiveDate], rest: &HashSet<Weekday>, taper_rest: bool) -> Vec<bool> {
    dates.iter().map(|d| self.is_rest_day(*d, rest, taper_rest)).collect()
  }

  /// One assignment per day of `week`, in date order
  pub fn decompose_week(&self, week: &Periodization) -> Result<Vec<DailyAssignment>, ValidationError> {
    let dates: Vec<NaiveDate> = week
      .start_date
      .iter_days()
      .take_while(|d| *d < week.end_date)
      .collect();

    let tapering = week.intensity == IntensityBand::Taper || dates.iter().any(|d| self.is_tapering_day(*d));
    let rest = rest_weekdays(week.intensity, tapering);

    let mut rest_flags = self.rest_flags(&dates, &rest, tapering);
    if tapering && rest_flags.iter().all(|r| *r) {
      // Preferred days fall only on taper rest days: keep them, the taper
      // already shows in the week's hours
      rest_flags = self.rest_flags(&dates, &rest, false);
    }
    let training: Vec<usize> = (0..dates.len()).filter(|i| !rest_flags[*i]).collect();
    if training.is_empty() {
      return Err(ValidationError::WeekFullyExcluded {
        week: week.week_number,
      });
    }

    let budget = budget_minutes(week.weekly_hours);
    let sessions = assign_session_types(&week.priorities, training.len());
    let light = budget < LIGHT_WEEK_MINUTES;

    let minutes = if light {
      split_evenly(budget, training.len())
    } else {
      let weights: Vec<u8> = sessions.iter().map(|p| p.weight).collect();
      split_minutes(budget, &weights)
    };

    let mut optional = vec![light; training.len()];
    let cap = self.config.max_sessions_per_week() as usize;
    if !light && training.len() > cap {
      // Lowest weight first; the later day goes first on a tie
      let mut order: Vec<usize> = (0..training.len()).collect();
      order.sort_by_key(|i| (sessions[*i].weight, std::cmp::Reverse(*i)));
      for i in order.into_iter().take(training.len() - cap) {
        optional[i] = true;
      }
    }

    let mut days: Vec<DailyAssignment> = dates
      .iter()
      .map(|d| DailyAssignment::rest(*d, week.week_number, week.period, week.intensity))
      .collect();

    for (slot, day_index) in training.iter().enumerate() {
      if minutes[slot] == 0 {
        continue;
      }
      let day = &mut days[*day_index];
      day.is_rest_day = false;
      day.session_type = Some(sessions[slot].session_type);
      day.estimated_duration = minutes[slot];
      day.is_optional = optional[slot];
    }

    debug!(
      week = week.week_number,
      budget,
      training_days = training.len(),
      light,
      "decomposed week"
    );

    Ok(days)
  }

  /// Decompose every week of a season, in order
  pub fn decompose(&self, weeks: &[Periodization]) -> Result<Vec<DailyAssignment>, ValidationError> {
    let mut all = Vec::with_capacity(
      calendar::plan_length_days(self.config.plan_start_date(), self.config.plan_end_date()) as usize,
    );
    for week in weeks {
      all.extend(self.decompose_week(week)?);
    }
    Ok(all)
  }
}

/// Total session minutes in a set of assignments
pub fn total_minutes(days: &[DailyAssignment]) -> u32 {
  days.iter().map(|d| d.estimated_duration).sum()
}

/// Session types that appear in a set of assignments
pub fn session_mix(days: &[DailyAssignment]) -> Vec<(SessionType, usize)> {
  let mut mix: Vec<(SessionType, usize)> = Vec::new();
  for session in days.iter().filter_map(|d| d.session_type) {
    match mix.iter_mut().find(|(s, _)| *s == session) {
      Some((_, n)) => *n += 1,
      None => mix.push((session, 1)),
    }
  }
  mix
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{priorities_for, Importance, LearningPhase, Period, Setting};
  use chrono::Duration;

  fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
  }

  fn week(period: Period, intensity: IntensityBand, hours: f64) -> Periodization {
    Periodization {
      week_number: 1,
      start_date: monday(),
      end_date: monday() + Duration::days(7),
      period,
      week_in_period: 1,
      learning_phase: LearningPhase::L3,
      setting: Setting::S4,
      intensity,
      weekly_hours: hours,
      priorities: priorities_for(period).to_vec(),
    }
  }

  fn config() -> PlanConfig {
    PlanConfig::builder(monday(), 12.0).build().unwrap()
  }

  #[test]
  fn test_budget_minutes_rounds_to_slot() {
    assert_eq!(budget_minutes(10.2), 610);
    assert_eq!(budget_minutes(7.2), 430);
    assert_eq!(budget_minutes(0.0), 0);
  }

  #[test]
  fn test_split_minutes_sums_exactly() {
    let minutes = split_minutes(610, &[40, 30, 15, 15, 40, 30]);
    assert_eq!(minutes.iter().sum::<u32>(), 610);
    assert!(minutes.iter().all(|m| *m > 0 && m % 5 == 0));
  }

  #[test]
  fn test_split_minutes_negative_drift_spills_over() {
    // Every share rounds up to the minimum slot
    let minutes = split_minutes(20, &[1, 1, 1, 98]);
    assert_eq!(minutes.iter().sum::<u32>(), 20);
    assert!(minutes.iter().all(|m| *m >= 5));
  }

  #[test]
  fn test_split_evenly() {
    assert_eq!(split_evenly(150, 4), vec![40, 40, 35, 35]);
    assert_eq!(split_evenly(10, 4), vec![5, 5, 0, 0]);
  }

  #[test]
  fn test_fair_share_session_types() {
    let priorities = priorities_for(Period::Base);
    let assigned = assign_session_types(priorities, 5);
    let types: Vec<SessionType> = assigned.iter().map(|p| p.session_type).collect();
    assert_eq!(
      types,
      vec![
        SessionType::Technical,
        SessionType::Technical,
        SessionType::Physical,
        SessionType::Physical,
        SessionType::Mental,
      ]
    );
  }

  #[test]
  fn test_medium_week_rests_sunday_and_wednesday() {
    let config = config();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Base, IntensityBand::Medium, 10.2))
      .unwrap();

    assert_eq!(days.len(), 7);
    let rest: Vec<Weekday> = days.iter().filter(|d| d.is_rest_day).map(|d| d.day_of_week).collect();
    assert_eq!(rest, vec![Weekday::Wed, Weekday::Sun]);
    assert_eq!(total_minutes(&days), 610);
    for day in &days {
      assert_eq!(day.is_rest_day, day.session_type.is_none());
      if day.is_rest_day {
        assert_eq!(day.estimated_duration, 0);
      } else {
        assert!(day.estimated_duration > 0);
      }
    }
  }

  #[test]
  fn test_peak_week_caps_sessions() {
    let config = PlanConfig::builder(monday(), 12.0)
      .max_sessions_per_week(5)
      .build()
      .unwrap();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Specialization, IntensityBand::Peak, 15.0))
      .unwrap();

    assert_eq!(days.iter().filter(|d| d.is_rest_day).count(), 1);
    assert_eq!(days.iter().filter(|d| d.is_optional).count(), 1);
    assert_eq!(total_minutes(&days), 900);
  }

  #[test]
  fn test_light_week_is_optional() {
    let config = config();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Evaluation, IntensityBand::Low, 2.5))
      .unwrap();

    let sessions: Vec<&DailyAssignment> = days.iter().filter(|d| !d.is_rest_day).collect();
    assert_eq!(sessions.len(), 5);
    assert!(sessions.iter().all(|d| d.is_optional));
    assert_eq!(total_minutes(&days), 150);
  }

  #[test]
  fn test_tapering_week_rests_three_days() {
    let config = config();
    let event = ScheduledTournament {
      name: "Club Championship".into(),
      start_date: monday() + Duration::days(9),
      end_date: monday() + Duration::days(9),
      importance: Importance::A,
      week_number: 2,
      topping_start_week: Some(1),
      topping_duration_weeks: 1,
      tapering_start_date: Some(monday() + Duration::days(2)),
      tapering_duration_days: 7,
      focus_areas: vec![],
    };
    let events = [event];
    let decomposer = DailyDecomposer::new(&config, &events);
    let days = decomposer
      .decompose_week(&week(Period::Tournament, IntensityBand::Peak, 7.2))
      .unwrap();

    assert_eq!(days.iter().filter(|d| d.is_rest_day).count(), 3);
    assert_eq!(total_minutes(&days), 430);
  }

  #[test]
  fn test_preferred_days_and_exclusions() {
    let config = PlanConfig::builder(monday(), 12.0)
      .preferred_training_days([Weekday::Mon, Weekday::Tue, Weekday::Thu, Weekday::Sat])
      .exclude_dates([monday() + Duration::days(1)])
      .build()
      .unwrap();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Base, IntensityBand::High, 10.0))
      .unwrap();

    let training: Vec<Weekday> = days.iter().filter(|d| !d.is_rest_day).map(|d| d.day_of_week).collect();
    assert_eq!(training, vec![Weekday::Mon, Weekday::Thu, Weekday::Sat]);
    assert_eq!(total_minutes(&days), 600);
  }

  #[test]
  fn test_taper_keeps_preferred_wednesday_and_friday() {
    let config = PlanConfig::builder(monday(), 12.0)
      .preferred_training_days([Weekday::Wed, Weekday::Fri])
      .build()
      .unwrap();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Tournament, IntensityBand::Taper, 4.0))
      .unwrap();

    let training: Vec<Weekday> = days.iter().filter(|d| !d.is_rest_day).map(|d| d.day_of_week).collect();
    assert_eq!(training, vec![Weekday::Wed, Weekday::Fri]);
    assert_eq!(total_minutes(&days), 240);
  }

  #[test]
  fn test_taper_rest_applies_when_other_preferred_days_remain() {
    let config = PlanConfig::builder(monday(), 12.0)
      .preferred_training_days([Weekday::Mon, Weekday::Wed, Weekday::Fri])
      .build()
      .unwrap();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let days = decomposer
      .decompose_week(&week(Period::Tournament, IntensityBand::Taper, 4.0))
      .unwrap();

    let training: Vec<Weekday> = days.iter().filter(|d| !d.is_rest_day).map(|d| d.day_of_week).collect();
    assert_eq!(training, vec![Weekday::Mon]);
  }

  #[test]
  fn test_fully_excluded_week_rejected() {
    let config = PlanConfig::builder(monday(), 12.0)
      .exclude_dates((0..7).map(|i| monday() + Duration::days(i)))
      .build()
      .unwrap();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let result = decomposer.decompose_week(&week(Period::Base, IntensityBand::High, 10.0));
    assert_eq!(result, Err(ValidationError::WeekFullyExcluded { week: 1 }));
  }

  #[test]
  fn test_long_final_week() {
    let config = config();
    let decomposer = DailyDecomposer::new(&config, &[]);
    let mut last = week(Period::Evaluation, IntensityBand::Medium, 8.4);
    last.end_date = last.start_date + Duration::days(9);
    let days = decomposer.decompose_week(&last).unwrap();

    assert_eq!(days.len(), 9);
    assert_eq!(total_minutes(&days), 505);
    assert!(session_mix(&days).iter().map(|(_, n)| n).sum::<usize>() >= 1);
  }
}
