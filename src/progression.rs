//! Week-by-week Progression Curve
//!
//! For every plan week computes four values from the week's period, its
//! position inside the contiguous block, and its closeness to a taper:
//! - learning phase (L1..L5)
//! - environmental setting (S1..S10)
//! - intensity band
//! - weekly hour budget
//!
//! Key principles:
//! - Phase and setting climb within a block and only reset at a block start
//! - The first week of a block sits at the bottom of its band
//! - Hours decay linearly through each peaking window and never rise inside it
//! - Pure function of its inputs: identical inputs give identical output

use serde::{Deserialize, Serialize};

use crate::models::{
    Category, IntensityBand, LearningPhase, Period, ScheduledTournament, Setting,
};

// ---------------------------------------------------------------------------
/// Bands per period
// ---------------------------------------------------------------------------

/// Inclusive learning-phase band
pub fn learning_phase_band(period: Period) -> (LearningPhase, LearningPhase) {
    match period {
        Period::Evaluation => (LearningPhase::L3, LearningPhase::L4),
        Period::Base => (LearningPhase::L1, LearningPhase::L3),
        Period::Specialization => (LearningPhase::L3, LearningPhase::L5),
        Period::Tournament => (LearningPhase::L5, LearningPhase::L5),
    }
}

/// Inclusive setting band
pub fn setting_band(period: Period) -> (Setting, Setting) {
    match period {
        Period::Evaluation => (Setting::S2, Setting::S4),
        Period::Base => (Setting::S1, Setting::S4),
        Period::Specialization => (Setting::S4, Setting::S8),
        Period::Tournament => (Setting::S8, Setting::S10),
    }
}

/// Share of the weekly target a period trains at
pub fn period_multiplier(period: Period) -> f64 {
    match period {
        Period::Evaluation => 0.7,
        Period::Base => 0.85,
        Period::Specialization => 1.0,
        Period::Tournament => 0.6,
    }
}

/// Intensity for a (period, phase) pair
pub fn intensity_for(period: Period, phase: LearningPhase) -> IntensityBand {
    match (period, phase) {
        (Period::Evaluation, LearningPhase::L4 | LearningPhase::L5) => IntensityBand::Medium,
        (Period::Evaluation, _) => IntensityBand::Low,
        (Period::Base, LearningPhase::L2) => IntensityBand::High,
        (Period::Base, _) => IntensityBand::Medium,
        (Period::Specialization, LearningPhase::L5) => IntensityBand::Peak,
        (Period::Specialization, _) => IntensityBand::High,
        (Period::Tournament, _) => IntensityBand::Peak,
    }
}

/// Position `f` in [0, 1) mapped onto an inclusive integer band
fn step_level(min: u8, max: u8, f: f64) -> u8 {
    let raw = (min as f64 + f * (max - min) as f64).round();
    (raw as u8).clamp(min, max)
}

fn round_tenth(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
/// Week Progression: one row of the curve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekProgression {
    pub week_number: u32,
    pub period: Period,
    /// 1-based position inside the contiguous block
    pub week_in_period: u32,
    pub block_length: u32,
    pub learning_phase: LearningPhase,
    pub setting: Setting,
    pub intensity: IntensityBand,
    pub weekly_hours: f64,
}

// ---------------------------------------------------------------------------
/// Progression Curve
// ---------------------------------------------------------------------------

pub struct ProgressionCurve {
    weekly_hours_target: f64,
    taper_floor: f64,
    category: Category,
}

impl ProgressionCurve {
    pub fn new(weekly_hours_target: f64, taper_floor: f64, category: Category) -> Self {
        Self {
            weekly_hours_target,
            taper_floor,
            category,
        }
    }

    /// Compute the curve for a full season. `periods[0]` is week 1.
    pub fn compute(
        &self,
        periods: &[Period],
        tournaments: &[ScheduledTournament],
    ) -> Vec<WeekProgression> {
        let windows: Vec<(u32, u32)> = tournaments
            .iter()
            .filter_map(|t| t.taper_window())
            .collect();
        let event_weeks: Vec<u32> = tournaments
            .iter()
            .filter(|t| t.is_peaking_target())
            .map(|t| t.week_number)
            .collect();

        let mut weeks: Vec<WeekProgression> = Vec::with_capacity(periods.len());

        for (period, start, len) in contiguous_blocks(periods) {
            let (phase_min, phase_max) = learning_phase_band(period);
            let (setting_min, setting_max) = setting_band(period);

            for pos in 0..len {
                let week_number = (start + pos) as u32 + 1;
                let f = pos as f64 / len as f64;

                let phase_level = step_level(phase_min.level(), phase_max.level(), f);
                let setting_level = step_level(setting_min.level(), setting_max.level(), f);
                let learning_phase = LearningPhase::from_level(phase_level).unwrap_or(phase_min);
                let setting = Setting::from_level(setting_level).unwrap_or(setting_min);

                let intensity = if event_weeks.contains(&week_number) {
                    IntensityBand::Taper
                } else {
                    intensity_for(period, learning_phase)
                };

                weeks.push(WeekProgression {
                    week_number,
                    period,
                    week_in_period: pos as u32 + 1,
                    block_length: len as u32,
                    learning_phase,
                    setting,
                    intensity,
                    weekly_hours: self.week_hours(period, week_number, &windows),
                });
            }
        }

        // Non-increasing through every peaking window
        for (start, end) in &windows {
            for week in (start + 1)..=*end {
                let prev = weeks[week as usize - 2].weekly_hours;
                let current = &mut weeks[week as usize - 1].weekly_hours;
                if *current > prev {
                    *current = prev;
                }
            }
        }

        weeks
    }

    /// Linear decay from 1.0 at the window start to the floor at the event
    pub fn taper_factor(&self, week: u32, windows: &[(u32, u32)]) -> f64 {
        windows
            .iter()
            .filter(|(start, end)| week >= *start && week <= *end)
            .map(|(start, end)| {
                if start == end {
                    self.taper_floor
                } else {
                    let progress = (week - start) as f64 / (end - start) as f64;
                    1.0 - (1.0 - self.taper_floor) * progress
                }
            })
            .fold(1.0, f64::min)
    }

    fn week_hours(&self, period: Period, week: u32, windows: &[(u32, u32)]) -> f64 {
        let (min, max) = self.category.weekly_hours_range();
        let raw = self.weekly_hours_target * period_multiplier(period) * self.taper_factor(week, windows);
        round_tenth(raw.clamp(min, max))
    }
}

/// Maximal runs of equal periods as (period, start index, length)
pub fn contiguous_blocks(periods: &[Period]) -> Vec<(Period, usize, usize)> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < periods.len() {
        let period = periods[i];
        let start = i;
        while i < periods.len() && periods[i] == period {
            i += 1;
        }
        blocks.push((period, start, i - start));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Importance;
    use chrono::NaiveDate;

    fn peak(week: u32, topping_start: u32) -> ScheduledTournament {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
            + chrono::Duration::days((week as i64 - 1) * 7);
        ScheduledTournament {
            name: format!("Event {}", week),
            start_date: date,
            end_date: date,
            importance: Importance::A,
            week_number: week,
            topping_start_week: Some(topping_start),
            topping_duration_weeks: week - topping_start,
            tapering_start_date: None,
            tapering_duration_days: 7,
            focus_areas: vec![],
        }
    }

    fn season(layout: &[(Period, usize)]) -> Vec<Period> {
        layout
            .iter()
            .flat_map(|(p, n)| std::iter::repeat(*p).take(*n))
            .collect()
    }

    #[test]
    fn test_block_starts_at_band_floor() {
        let periods = season(&[
            (Period::Evaluation, 4),
            (Period::Base, 16),
            (Period::Specialization, 16),
            (Period::Tournament, 12),
            (Period::Evaluation, 4),
        ]);
        let curve = ProgressionCurve::new(12.0, 0.4, Category::E).compute(&periods, &[]);

        assert_eq!(curve.len(), 52);
        assert_eq!(curve[4].learning_phase, LearningPhase::L1);
        assert_eq!(curve[4].setting, Setting::S1);
        assert_eq!(curve[20].learning_phase, LearningPhase::L3);
        assert_eq!(curve[20].setting, Setting::S4);
        assert_eq!(curve[36].learning_phase, LearningPhase::L5);
        assert_eq!(curve[36].setting, Setting::S8);
    }

    #[test]
    fn test_phase_non_decreasing_within_block() {
        let periods = season(&[(Period::Base, 20), (Period::Specialization, 32)]);
        let curve = ProgressionCurve::new(12.0, 0.4, Category::E).compute(&periods, &[]);

        for pair in curve.windows(2) {
            if pair[0].period == pair[1].period {
                assert!(pair[1].learning_phase >= pair[0].learning_phase);
                assert!(pair[1].setting >= pair[0].setting);
            }
        }
        // Last week of a block reaches the top of its band
        assert_eq!(curve[19].learning_phase, LearningPhase::L3);
        assert_eq!(curve[51].learning_phase, LearningPhase::L5);
    }

    #[test]
    fn test_hours_follow_period_multiplier() {
        let periods = season(&[
            (Period::Evaluation, 13),
            (Period::Base, 13),
            (Period::Specialization, 13),
            (Period::Tournament, 13),
        ]);
        let curve = ProgressionCurve::new(20.0, 0.4, Category::C).compute(&periods, &[]);

        assert_eq!(curve[0].weekly_hours, 14.0);
        assert_eq!(curve[13].weekly_hours, 17.0);
        assert_eq!(curve[26].weekly_hours, 20.0);
        assert_eq!(curve[39].weekly_hours, 12.0);
    }

    #[test]
    fn test_taper_decays_to_event_week() {
        let periods = season(&[
            (Period::Evaluation, 4),
            (Period::Base, 16),
            (Period::Specialization, 6),
            (Period::Tournament, 12),
            (Period::Specialization, 10),
            (Period::Evaluation, 4),
        ]);
        // Tournament block covers weeks 27..=38; event in week 30
        let curve = ProgressionCurve::new(15.0, 0.4, Category::C)
            .compute(&periods, &[peak(30, 27)]);

        let hours: Vec<f64> = (27..=30).map(|w| curve[w - 1].weekly_hours).collect();
        assert_eq!(hours, vec![9.0, 7.2, 5.4, 4.0]);
        assert_eq!(curve[29].intensity, IntensityBand::Taper);
    }

    #[test]
    fn test_taper_running_minimum_across_period_change() {
        let periods = season(&[
            (Period::Base, 20),
            (Period::Tournament, 1),
            (Period::Specialization, 1),
            (Period::Tournament, 30),
        ]);
        // Window 20..=23 crosses Base -> Tournament -> Specialization -> Tournament
        let curve = ProgressionCurve::new(20.0, 0.4, Category::A)
            .compute(&periods, &[peak(23, 20)]);

        for week in 21..=23 {
            assert!(curve[week - 1].weekly_hours <= curve[week - 2].weekly_hours);
        }
    }

    #[test]
    fn test_hours_clamped_to_category() {
        let periods = season(&[(Period::Tournament, 52)]);
        let curve = ProgressionCurve::new(8.0, 0.4, Category::A).compute(&periods, &[peak(10, 7)]);

        // 8 * 0.6 = 4.8 sits under the category A floor of 6
        assert!(curve.iter().all(|w| w.weekly_hours >= 6.0));
    }

    #[test]
    fn test_overlapping_windows_take_lowest_factor() {
        let curve = ProgressionCurve::new(12.0, 0.5, Category::E);
        let windows = [(10, 14), (12, 13)];
        assert_eq!(curve.taper_factor(9, &windows), 1.0);
        assert_eq!(curve.taper_factor(12, &windows), 0.75);
        assert_eq!(curve.taper_factor(13, &windows), 0.5);
        assert_eq!(curve.taper_factor(14, &windows), 0.5);
    }

    #[test]
    fn test_intensity_lookup() {
        assert_eq!(intensity_for(Period::Evaluation, LearningPhase::L3), IntensityBand::Low);
        assert_eq!(intensity_for(Period::Evaluation, LearningPhase::L4), IntensityBand::Medium);
        assert_eq!(intensity_for(Period::Base, LearningPhase::L2), IntensityBand::High);
        assert_eq!(intensity_for(Period::Specialization, LearningPhase::L5), IntensityBand::Peak);
        assert_eq!(intensity_for(Period::Tournament, LearningPhase::L5), IntensityBand::Peak);
    }

    #[test]
    fn test_contiguous_blocks() {
        let periods = season(&[(Period::Base, 3), (Period::Tournament, 2), (Period::Base, 1)]);
        assert_eq!(
            contiguous_blocks(&periods),
            vec![
                (Period::Base, 0, 3),
                (Period::Tournament, 3, 2),
                (Period::Base, 5, 1),
            ]
        );
    }
}
