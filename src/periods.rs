//! Period Allocator
//!
//! Splits the 52 plan weeks into Evaluation, Base, Specialization and
//! Tournament blocks. Allocation is deterministic: every tie is broken by
//! week number, so the same inputs always produce the same tags.
//!
//! Order of placement:
//! 1. Tournament candidates from A-tournament topping windows, truncated to
//!    the Tournament budget (farthest from an event goes first).
//! 2. Evaluation reserve at season start.
//! 3. Tournament block grown to its budget around the calendar's events.
//! 4. Specialization on the free weeks leading into Tournament weeks.
//! 5. Base on the remaining weeks in chronological order.
//! 6. Leftovers become Evaluation.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::debug;

use crate::calendar::SEASON_WEEKS;
use crate::config::PlanConfig;
use crate::error::PlanWarning;
use crate::models::{Period, ScheduledTournament};

/// ---------------------------------------------------------------------------
/// Allocation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
  /// Index 0 is week 1
  periods: Vec<Period>,
  pub warnings: Vec<PlanWarning>,
}

impl Allocation {
  pub fn periods(&self) -> &[Period] {
    &self.periods
  }

  pub fn period_of(&self, week: u32) -> Option<Period> {
    week
      .checked_sub(1)
      .and_then(|i| self.periods.get(i as usize))
      .copied()
  }

  pub fn count(&self, period: Period) -> u32 {
    self.periods.iter().filter(|p| **p == period).count() as u32
  }

  /// Weeks tagged with `period`, ascending
  pub fn weeks_of(&self, period: Period) -> Vec<u32> {
    self
      .periods
      .iter()
      .enumerate()
      .filter(|(_, p)| **p == period)
      .map(|(i, _)| i as u32 + 1)
      .collect()
  }
}

/// ---------------------------------------------------------------------------
/// Allocator
/// ---------------------------------------------------------------------------

pub struct PeriodAllocator<'a> {
  config: &'a PlanConfig,
}

fn distance(a: u32, b: u32) -> u32 {
  a.abs_diff(b)
}

fn nearest_distance(week: u32, anchors: &[u32]) -> u32 {
  anchors
    .iter()
    .map(|a| distance(week, *a))
    .min()
    .unwrap_or(u32::MAX)
}

impl<'a> PeriodAllocator<'a> {
  pub fn new(config: &'a PlanConfig) -> Self {
    Self { config }
  }

  pub fn allocate(&self, tournaments: &[ScheduledTournament]) -> Allocation {
    let mut slots: Vec<Option<Period>> = vec![None; SEASON_WEEKS as usize];
    let mut warnings = Vec::new();

    let tournament_budget = self.config.tournament_weeks();

    // 1. Topping windows of A-tournaments
    let peak_weeks: Vec<u32> = tournaments
      .iter()
      .filter(|t| t.is_peaking_target())
      .map(|t| t.week_number)
      .collect();

    let mut candidates: BTreeSet<u32> = BTreeSet::new();
    for t in tournaments.iter().filter(|t| t.is_peaking_target()) {
      let start = t.topping_start_week.unwrap_or(t.week_number);
      candidates.extend(start..=t.week_number);
    }

    if candidates.len() as u32 > tournament_budget {
      let mut ranked: Vec<u32> = candidates.iter().copied().collect();
      ranked.sort_by_key(|w| (Reverse(nearest_distance(*w, &peak_weeks)), Reverse(*w)));
      let excess = candidates.len() - tournament_budget as usize;
      let mut discarded: Vec<u32> = ranked.into_iter().take(excess).collect();
      for week in &discarded {
        candidates.remove(week);
      }
      discarded.sort_unstable();

      warnings.push(PlanWarning::TournamentWeeksTruncated {
        candidates: (candidates.len() + excess) as u32,
        budget: tournament_budget,
        discarded_weeks: discarded,
      });
    }

    for week in &candidates {
      slots[*week as usize - 1] = Some(Period::Tournament);
    }

    // 2. Evaluation reserve at season start
    let reserve = self.config.evaluation_weeks().min(self.config.remainder_weeks());
    let reserved: Vec<usize> = (0..slots.len())
      .filter(|i| slots[*i].is_none())
      .take(reserve as usize)
      .collect();
    for i in reserved {
      slots[i] = Some(Period::Evaluation);
    }

    // 3. Grow the Tournament block to its budget
    let placed = candidates.len() as u32;
    if placed < tournament_budget {
      let event_weeks: Vec<u32> = tournaments.iter().map(|t| t.week_number).collect();
      let mut free = free_weeks(&slots);
      if event_weeks.is_empty() {
        free.sort_by_key(|w| (SEASON_WEEKS - *w, Reverse(*w)));
      } else {
        free.sort_by_key(|w| (nearest_distance(*w, &event_weeks), Reverse(*w)));
      }
      for week in free.into_iter().take((tournament_budget - placed) as usize) {
        slots[week as usize - 1] = Some(Period::Tournament);
      }
    }

    // 4. Specialization leads into Tournament weeks
    let tournament_weeks: Vec<u32> = weeks_tagged(&slots, Period::Tournament);
    let mut free = free_weeks(&slots);
    free.sort_by_key(|w| {
      let ahead = tournament_weeks
        .iter()
        .find(|t| **t > *w)
        .map(|t| t - w)
        .unwrap_or(u32::MAX);
      (ahead, Reverse(*w))
    });
    for week in free.into_iter().take(self.config.specialization_weeks() as usize) {
      slots[week as usize - 1] = Some(Period::Specialization);
    }

    // 5. Base in chronological order
    for week in free_weeks(&slots)
      .into_iter()
      .take(self.config.base_period_weeks() as usize)
    {
      slots[week as usize - 1] = Some(Period::Base);
    }

    // 6. Leftovers
    let periods: Vec<Period> = slots
      .into_iter()
      .map(|p| p.unwrap_or(Period::Evaluation))
      .collect();

    let allocation = Allocation { periods, warnings };
    debug!(
      evaluation = allocation.count(Period::Evaluation),
      base = allocation.count(Period::Base),
      specialization = allocation.count(Period::Specialization),
      tournament = allocation.count(Period::Tournament),
      "allocated periods"
    );
    allocation
  }
}

fn free_weeks(slots: &[Option<Period>]) -> Vec<u32> {
  slots
    .iter()
    .enumerate()
    .filter(|(_, p)| p.is_none())
    .map(|(i, _)| i as u32 + 1)
    .collect()
}

fn weeks_tagged(slots: &[Option<Period>], period: Period) -> Vec<u32> {
  slots
    .iter()
    .enumerate()
    .filter(|(_, p)| **p == Some(period))
    .map(|(i, _)| i as u32 + 1)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Importance;
  use chrono::{Duration, NaiveDate};

  fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
  }

  fn tournament(name: &str, week: u32, importance: Importance, topping: Option<u32>) -> ScheduledTournament {
    let date = start() + Duration::days((week as i64 - 1) * 7);
    ScheduledTournament {
      name: name.to_string(),
      start_date: date,
      end_date: date,
      importance,
      week_number: week,
      topping_start_week: topping,
      topping_duration_weeks: topping.map(|s| week - s).unwrap_or(0),
      tapering_start_date: None,
      tapering_duration_days: 0,
      focus_areas: vec![],
    }
  }

  fn assert_counts(allocation: &Allocation, config: &PlanConfig) {
    assert_eq!(allocation.periods().len(), 52);
    assert_eq!(allocation.count(Period::Base), config.base_period_weeks());
    assert_eq!(allocation.count(Period::Specialization), config.specialization_weeks());
    assert_eq!(allocation.count(Period::Tournament), config.tournament_weeks());
    assert_eq!(allocation.count(Period::Evaluation), config.remainder_weeks());
  }

  #[test]
  fn test_topping_window_tagged_tournament() {
    let config = PlanConfig::builder(start(), 15.0).build().unwrap();
    let allocation = PeriodAllocator::new(&config)
      .allocate(&[tournament("Club Championship", 30, Importance::A, Some(27))]);

    for week in 27..=30 {
      assert_eq!(allocation.period_of(week), Some(Period::Tournament), "week {}", week);
    }
    assert_counts(&allocation, &config);
    assert!(allocation.warnings.is_empty());
  }

  #[test]
  fn test_evaluation_reserved_at_season_start() {
    let config = PlanConfig::builder(start(), 12.0).build().unwrap();
    let allocation = PeriodAllocator::new(&config).allocate(&[]);

    for week in 1..=4 {
      assert_eq!(allocation.period_of(week), Some(Period::Evaluation));
    }
    assert_counts(&allocation, &config);
    // No events: Tournament block closes the season
    assert_eq!(allocation.weeks_of(Period::Tournament), (41..=52).collect::<Vec<_>>());
  }

  #[test]
  fn test_specialization_precedes_tournament_block() {
    let config = PlanConfig::builder(start(), 12.0).build().unwrap();
    let allocation = PeriodAllocator::new(&config).allocate(&[]);

    assert_eq!(allocation.weeks_of(Period::Specialization), (25..=40).collect::<Vec<_>>());
    assert_eq!(allocation.weeks_of(Period::Base), (5..=20).collect::<Vec<_>>());
  }

  #[test]
  fn test_zero_remainder_leaves_no_evaluation() {
    let config = PlanConfig::builder(start(), 12.0)
      .base_period_weeks(16)
      .specialization_weeks(20)
      .tournament_weeks(16)
      .build()
      .unwrap();
    let allocation = PeriodAllocator::new(&config).allocate(&[]);

    assert_eq!(allocation.count(Period::Evaluation), 0);
    assert_counts(&allocation, &config);
  }

  #[test]
  fn test_truncation_keeps_weeks_nearest_events() {
    let config = PlanConfig::builder(start(), 12.0)
      .tournament_weeks(5)
      .build()
      .unwrap();
    let allocation = PeriodAllocator::new(&config).allocate(&[
      tournament("Spring Major", 20, Importance::A, Some(17)),
      tournament("Autumn Major", 40, Importance::A, Some(37)),
    ]);

    // Candidates 17..=20 and 37..=40; both distance-3 weeks go first, then
    // the later of the two distance-2 weeks
    assert_eq!(allocation.weeks_of(Period::Tournament), vec![18, 19, 20, 39, 40]);
    assert_eq!(
      allocation.warnings,
      vec![PlanWarning::TournamentWeeksTruncated {
        candidates: 8,
        budget: 5,
        discarded_weeks: vec![17, 37, 38],
      }]
    );
    assert_counts(&allocation, &config);
  }

  #[test]
  fn test_tournament_block_grows_around_minor_events() {
    let config = PlanConfig::builder(start(), 12.0)
      .tournament_weeks(3)
      .build()
      .unwrap();
    let allocation = PeriodAllocator::new(&config)
      .allocate(&[tournament("Junior Tour 4", 33, Importance::C, None)]);

    assert_eq!(allocation.weeks_of(Period::Tournament), vec![32, 33, 34]);
  }

  #[test]
  fn test_allocation_is_deterministic() {
    let config = PlanConfig::builder(start(), 18.0).build().unwrap();
    let events = vec![
      tournament("Opener", 10, Importance::B, None),
      tournament("Major", 26, Importance::A, Some(23)),
      tournament("Closer", 48, Importance::A, Some(45)),
    ];
    let first = PeriodAllocator::new(&config).allocate(&events);
    let second = PeriodAllocator::new(&config).allocate(&events);
    assert_eq!(first, second);
    assert_counts(&first, &config);
  }
}
