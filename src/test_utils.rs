//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Baseline, config and calendar fixtures
//! - Helper assertions

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

use crate::assembler::{generate, PlanResult};
use crate::config::PlanConfig;
use crate::models::{Category, Importance, PlayerBaseline, TournamentInput};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// Monday 2025-01-06, a non-leap season
pub fn season_start() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid fixture date")
}

/// First day of `week` for a season starting at `season_start()`
pub fn week_start(week: u32) -> NaiveDate {
  season_start() + Duration::days((week as i64 - 1) * 7)
}

pub fn mock_baseline(player_id: &str) -> PlayerBaseline {
  PlayerBaseline {
    player_id: player_id.to_string(),
    average_score: 76.0,
    handicap: Some(4.2),
    driver_speed: Some(102.0),
    category: Category::D,
  }
}

pub fn mock_config(weekly_hours_target: f64) -> PlanConfig {
  PlanConfig::builder(season_start(), weekly_hours_target)
    .build()
    .expect("valid fixture config")
}

/// A typical junior calendar: one season target plus minor events
pub fn mock_calendar() -> Vec<TournamentInput> {
  vec![
    TournamentInput::new("Spring Junior Tour", week_start(14) + Duration::days(5), Importance::C),
    TournamentInput::new("Regional Qualifier", week_start(24) + Duration::days(4), Importance::B),
    TournamentInput::new("State Junior Championship", week_start(30) + Duration::days(3), Importance::A),
    TournamentInput::new("Autumn Classic", week_start(40) + Duration::days(5), Importance::B),
  ]
}

/// Generate a plan from the standard fixtures
pub fn generate_fixture_plan(player_id: &str) -> PlanResult {
  generate(
    &mock_baseline(player_id),
    Category::C,
    &mock_calendar(),
    &mock_config(14.0),
  )
  .expect("fixture plan generates")
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff <= $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('annual_training_plans', 'periodizations', 'daily_assignments', 'scheduled_tournaments', 'plan_modification_requests')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 plan tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_fixture_plan_is_complete() {
    let result = generate_fixture_plan("fixture-player");
    assert_eq!(result.periodizations.len(), 52);
    assert_eq!(result.daily_assignments.len(), 365);
    assert_eq!(result.tournaments.len(), 4);
  }

  #[test]
  fn test_week_start_helper() {
    assert_eq!(week_start(1), season_start());
    assert_eq!(week_start(2), NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
    assert_approx_eq!(mock_config(12.0).weekly_hours_target(), 12.0, 1e-9);
  }
}
