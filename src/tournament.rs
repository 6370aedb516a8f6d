//! Tournament Scheduler
//!
//! Places the season calendar on the plan's week grid and derives the
//! topping (peaking) and tapering windows for importance-A events.
//!
//! Conflicts between clustered A-tournaments are settled by chronological
//! priority: an earlier event keeps its window, a later window is clipped so
//! it starts after the earlier event's week. Windows are never merged.

use chrono::Duration;
use tracing::debug;

use crate::calendar;
use crate::config::PlanConfig;
use crate::error::{PlanWarning, ValidationError};
use crate::models::{Importance, ScheduledTournament, TournamentInput};

/// Scheduled calendar plus any conflicts resolved along the way
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
  pub tournaments: Vec<ScheduledTournament>,
  pub warnings: Vec<PlanWarning>,
}

pub struct TournamentScheduler<'a> {
  config: &'a PlanConfig,
}

impl<'a> TournamentScheduler<'a> {
  pub fn new(config: &'a PlanConfig) -> Self {
    Self { config }
  }

  /// Reject malformed or out-of-range entries before anything is computed
  pub fn validate_calendar(&self, tournaments: &[TournamentInput]) -> Result<(), ValidationError> {
    let plan_start = self.config.plan_start_date();
    let plan_end = self.config.plan_end_date();

    for t in tournaments {
      if t.name.trim().is_empty() {
        return Err(ValidationError::TournamentNameMissing);
      }
      if t.last_day() < t.start_date {
        return Err(ValidationError::TournamentDatesInverted { name: t.name.clone() });
      }
      for date in [t.start_date, t.last_day()] {
        if !calendar::in_plan(plan_start, plan_end, date) {
          return Err(ValidationError::TournamentOutOfRange {
            name: t.name.clone(),
            date,
            plan_start,
            plan_end,
          });
        }
      }
    }

    Ok(())
  }

  pub fn schedule(&self, tournaments: &[TournamentInput]) -> Result<ScheduleOutcome, ValidationError> {
    self.validate_calendar(tournaments)?;

    let plan_start = self.config.plan_start_date();
    let plan_end = self.config.plan_end_date();

    let mut ordered: Vec<&TournamentInput> = tournaments.iter().collect();
    ordered.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.name.cmp(&b.name)));

    let mut scheduled = Vec::with_capacity(ordered.len());
    let mut warnings = Vec::new();
    // (name, week) of the most recent A-tournament
    let mut previous_peak: Option<(String, u32)> = None;

    for input in ordered {
      let week_number = calendar::week_of(plan_start, plan_end, input.start_date).ok_or_else(|| {
        ValidationError::TournamentOutOfRange {
          name: input.name.clone(),
          date: input.start_date,
          plan_start,
          plan_end,
        }
      })?;

      let mut entry = ScheduledTournament {
        name: input.name.clone(),
        start_date: input.start_date,
        end_date: input.last_day(),
        importance: input.importance,
        week_number,
        topping_start_week: None,
        topping_duration_weeks: 0,
        tapering_start_date: None,
        tapering_duration_days: 0,
        focus_areas: input
          .importance
          .focus_areas()
          .iter()
          .map(|s| s.to_string())
          .collect(),
      };

      if input.importance == Importance::A {
        let topping_start = self.topping_start(input, week_number, previous_peak.as_ref(), &mut warnings);
        entry.topping_start_week = Some(topping_start);
        entry.topping_duration_weeks = week_number - topping_start;

        let (taper_start, taper_days) = self.tapering_window(input, &mut warnings);
        entry.tapering_start_date = Some(taper_start);
        entry.tapering_duration_days = taper_days;

        debug!(
          tournament = %input.name,
          week = week_number,
          topping_start,
          taper_days,
          "scheduled peaking target"
        );
        previous_peak = Some((input.name.clone(), week_number));
      }

      scheduled.push(entry);
    }

    Ok(ScheduleOutcome {
      tournaments: scheduled,
      warnings,
    })
  }

  fn topping_start(
    &self,
    input: &TournamentInput,
    week_number: u32,
    previous_peak: Option<&(String, u32)>,
    warnings: &mut Vec<PlanWarning>,
  ) -> u32 {
    let requested = week_number as i64 - self.config.topping_duration_weeks_default() as i64;

    let mut start = if requested < 1 {
      warnings.push(PlanWarning::ToppingClamped {
        tournament: input.name.clone(),
        requested_start_week: requested,
      });
      1
    } else {
      requested as u32
    };

    if let Some((earlier_name, earlier_week)) = previous_peak {
      if start <= *earlier_week {
        let clipped = (earlier_week + 1).min(week_number);
        warnings.push(PlanWarning::ToppingClipped {
          tournament: input.name.clone(),
          earlier_tournament: earlier_name.clone(),
          requested_start_week: start,
          clipped_start_week: clipped,
        });
        start = clipped;
      }
    }

    start
  }

  fn tapering_window(
    &self,
    input: &TournamentInput,
    warnings: &mut Vec<PlanWarning>,
  ) -> (chrono::NaiveDate, u32) {
    let requested = self.config.tapering_duration_days_default();
    let plan_start = self.config.plan_start_date();
    let wanted_start = input.start_date - Duration::days(requested as i64);

    if wanted_start >= plan_start {
      return (wanted_start, requested);
    }

    let effective = (input.start_date - plan_start).num_days() as u32;
    warnings.push(PlanWarning::TaperingClamped {
      tournament: input.name.clone(),
      requested_days: requested,
      effective_days: effective,
    });
    (plan_start, effective)
  }
}
