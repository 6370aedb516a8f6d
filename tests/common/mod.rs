//! Shared fixtures for integration tests

#![allow(dead_code)]

use annual_plan_lib::models::{Category, Importance, PlayerBaseline, TournamentInput};
use annual_plan_lib::PlanConfig;
use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;

/// Monday 2025-01-06
pub fn season_start() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

/// A date inside `week` of a season starting at `season_start()`
pub fn in_week(week: u32, offset_days: i64) -> NaiveDate {
  season_start() + Duration::days((week as i64 - 1) * 7 + offset_days)
}

pub fn baseline(player_id: &str) -> PlayerBaseline {
  PlayerBaseline {
    player_id: player_id.to_string(),
    average_score: 74.0,
    handicap: Some(2.8),
    driver_speed: Some(108.0),
    category: Category::C,
  }
}

pub fn config(weekly_hours_target: f64) -> PlanConfig {
  PlanConfig::builder(season_start(), weekly_hours_target)
    .build()
    .unwrap()
}

pub fn a_event(name: &str, week: u32) -> TournamentInput {
  TournamentInput::new(name, in_week(week, 3), Importance::A)
}

/// In-memory store with one connection so every query sees the same database
pub async fn memory_pool() -> SqlitePool {
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
