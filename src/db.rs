use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::assembler::PlanResult;
use crate::calendar;
use crate::models::{
  AnnualTrainingPlan, DailyAssignment, Importance, LifecycleError, ModificationRequest,
  Periodization, PlanStatus, Priority, ScheduledTournament, SessionType, Urgency,
};

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
pub struct AppState {
  pub db: DbPool,
}

/// Minimum length of a rejection reason, after trimming
pub const MIN_REJECTION_REASON_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Plan not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error("Invalid request: {0}")]
  InvalidRequest(String),

  #[error("Plan {0} changed while updating, retry")]
  Conflict(String),

  #[error("Stored data is corrupt: {0}")]
  Corrupt(String),
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .foreign_keys(true);

  info!(url = database_url, "initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect_with(options)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("database initialized");

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Stored records
/// ---------------------------------------------------------------------------

/// Plan header as persisted, with store-assigned id and lifecycle metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlan {
  pub id: String,
  #[serde(flatten)]
  pub plan: AnnualTrainingPlan,
  pub linked: bool,
  pub rejection_reason: Option<String>,
  pub created_at: String,
}

/// Full record set of one plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
  pub plan: StoredPlan,
  pub periodizations: Vec<Periodization>,
  pub daily_assignments: Vec<DailyAssignment>,
  pub tournaments: Vec<ScheduledTournament>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredModificationRequest {
  pub id: String,
  pub plan_id: String,
  pub concerns: Vec<String>,
  pub notes: Option<String>,
  pub urgency: Urgency,
  pub status: String,
  pub created_at: String,
}

fn parse_field<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, StoreError>
where
  T::Err: std::fmt::Display,
{
  let raw: String = row.try_get(column)?;
  raw
    .parse::<T>()
    .map_err(|e| StoreError::Corrupt(format!("{} '{}': {}", column, raw, e)))
}

fn parse_optional_date(row: &SqliteRow, column: &str) -> Result<Option<NaiveDate>, StoreError> {
  let raw: Option<String> = row.try_get(column)?;
  raw
    .map(|s| {
      s.parse::<NaiveDate>()
        .map_err(|e| StoreError::Corrupt(format!("{} '{}': {}", column, s, e)))
    })
    .transpose()
}

fn parse_json<T: serde::de::DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T, StoreError> {
  let raw: String = row.try_get(column)?;
  serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(format!("{}: {}", column, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
  serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn plan_from_row(row: &SqliteRow) -> Result<StoredPlan, StoreError> {
  let weeks = |column: &str| -> Result<u32, StoreError> { Ok(row.try_get::<i64, _>(column)? as u32) };

  Ok(StoredPlan {
    id: row.try_get("id")?,
    plan: AnnualTrainingPlan {
      player_id: row.try_get("player_id")?,
      plan_name: row.try_get("plan_name")?,
      start_date: parse_field(row, "start_date")?,
      end_date: parse_field(row, "end_date")?,
      status: parse_field(row, "status")?,
      baseline_average_score: row.try_get("baseline_average_score")?,
      baseline_handicap: row.try_get("baseline_handicap")?,
      baseline_driver_speed: row.try_get("baseline_driver_speed")?,
      category: parse_field(row, "category")?,
      weekly_hours_target: row.try_get("weekly_hours_target")?,
      evaluation_weeks: weeks("evaluation_weeks")?,
      base_period_weeks: weeks("base_period_weeks")?,
      specialization_weeks: weeks("specialization_weeks")?,
      tournament_weeks: weeks("tournament_weeks")?,
    },
    linked: row.try_get::<i64, _>("linked")? != 0,
    rejection_reason: row.try_get("rejection_reason")?,
    created_at: row.try_get("created_at")?,
  })
}

/// ---------------------------------------------------------------------------
/// Commit
/// ---------------------------------------------------------------------------

/// Persist a generated plan in one transaction, replacing the player's
/// currently linked plan. Returns the new plan id.
pub async fn save_plan(pool: &DbPool, result: &PlanResult) -> Result<String, StoreError> {
  let id = Uuid::new_v4().to_string();
  let mut tx = pool.begin().await?;

  let replaced = sqlx::query("DELETE FROM annual_training_plans WHERE player_id = ? AND linked = 1")
    .bind(&result.plan.player_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

  insert_plan(&mut tx, &id, &result.plan).await?;
  insert_periodizations(&mut tx, &id, &result.periodizations).await?;
  insert_daily_assignments(&mut tx, &id, &result.daily_assignments).await?;
  insert_tournaments(&mut tx, &id, &result.tournaments).await?;

  tx.commit().await?;

  info!(
    plan_id = %id,
    player_id = %result.plan.player_id,
    replaced,
    "committed annual plan"
  );

  Ok(id)
}

async fn insert_plan(
  tx: &mut Transaction<'_, Sqlite>,
  id: &str,
  plan: &AnnualTrainingPlan,
) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO annual_training_plans (
      id, player_id, plan_name, start_date, end_date, status,
      baseline_average_score, baseline_handicap, baseline_driver_speed, category,
      weekly_hours_target, evaluation_weeks, base_period_weeks,
      specialization_weeks, tournament_weeks, linked
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 1)
    "#,
  )
  .bind(id)
  .bind(&plan.player_id)
  .bind(&plan.plan_name)
  .bind(plan.start_date.to_string())
  .bind(plan.end_date.to_string())
  .bind(plan.status.as_str())
  .bind(plan.baseline_average_score)
  .bind(plan.baseline_handicap)
  .bind(plan.baseline_driver_speed)
  .bind(plan.category.as_str())
  .bind(plan.weekly_hours_target)
  .bind(plan.evaluation_weeks as i64)
  .bind(plan.base_period_weeks as i64)
  .bind(plan.specialization_weeks as i64)
  .bind(plan.tournament_weeks as i64)
  .execute(&mut **tx)
  .await?;
  Ok(())
}

async fn insert_periodizations(
  tx: &mut Transaction<'_, Sqlite>,
  plan_id: &str,
  weeks: &[Periodization],
) -> Result<(), StoreError> {
  for week in weeks {
    sqlx::query(
      r#"
      INSERT INTO periodizations (
        plan_id, week_number, start_date, end_date, period, week_in_period,
        learning_phase, setting, intensity, weekly_hours, priorities
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      "#,
    )
    .bind(plan_id)
    .bind(week.week_number as i64)
    .bind(week.start_date.to_string())
    .bind(week.end_date.to_string())
    .bind(week.period.code().to_string())
    .bind(week.week_in_period as i64)
    .bind(week.learning_phase.to_string())
    .bind(week.setting.to_string())
    .bind(week.intensity.as_str())
    .bind(week.weekly_hours)
    .bind(to_json(&week.priorities)?)
    .execute(&mut **tx)
    .await?;
  }
  Ok(())
}

async fn insert_daily_assignments(
  tx: &mut Transaction<'_, Sqlite>,
  plan_id: &str,
  days: &[DailyAssignment],
) -> Result<(), StoreError> {
  for day in days {
    sqlx::query(
      r#"
      INSERT INTO daily_assignments (
        plan_id, assigned_date, week_number, day_of_week, session_type,
        estimated_duration, period, intensity, intensity_level, is_rest_day, is_optional
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      "#,
    )
    .bind(plan_id)
    .bind(day.assigned_date.to_string())
    .bind(day.week_number as i64)
    .bind(calendar::day_of_week_index(day.assigned_date) as i64)
    .bind(day.session_type.map(|s| s.as_str()))
    .bind(day.estimated_duration as i64)
    .bind(day.period.code().to_string())
    .bind(day.intensity.as_str())
    .bind(day.intensity.load_score() as i64)
    .bind(day.is_rest_day)
    .bind(day.is_optional)
    .execute(&mut **tx)
    .await?;
  }
  Ok(())
}

async fn insert_tournaments(
  tx: &mut Transaction<'_, Sqlite>,
  plan_id: &str,
  tournaments: &[ScheduledTournament],
) -> Result<(), StoreError> {
  for t in tournaments {
    sqlx::query(
      r#"
      INSERT INTO scheduled_tournaments (
        plan_id, name, start_date, end_date, importance, week_number,
        topping_start_week, topping_duration_weeks, tapering_start_date,
        tapering_duration_days, focus_areas
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      "#,
    )
    .bind(plan_id)
    .bind(&t.name)
    .bind(t.start_date.to_string())
    .bind(t.end_date.to_string())
    .bind(t.importance.as_str())
    .bind(t.week_number as i64)
    .bind(t.topping_start_week.map(|w| w as i64))
    .bind(t.topping_duration_weeks as i64)
    .bind(t.tapering_start_date.map(|d| d.to_string()))
    .bind(t.tapering_duration_days as i64)
    .bind(to_json(&t.focus_areas)?)
    .execute(&mut **tx)
    .await?;
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Reads
/// ---------------------------------------------------------------------------

const PLAN_COLUMNS: &str = r#"
  id, player_id, plan_name, start_date, end_date, status,
  baseline_average_score, baseline_handicap, baseline_driver_speed, category,
  weekly_hours_target, evaluation_weeks, base_period_weeks,
  specialization_weeks, tournament_weeks, linked, rejection_reason, created_at
"#;

pub async fn load_plan_header(pool: &DbPool, plan_id: &str) -> Result<StoredPlan, StoreError> {
  let row = sqlx::query(&format!("SELECT {} FROM annual_training_plans WHERE id = ?", PLAN_COLUMNS))
    .bind(plan_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(plan_id.to_string()))?;
  plan_from_row(&row)
}

/// Load a plan with its weeks, days and tournaments
pub async fn load_plan(pool: &DbPool, plan_id: &str) -> Result<PlanRecord, StoreError> {
  let plan = load_plan_header(pool, plan_id).await?;

  let week_rows = sqlx::query(
    r#"
    SELECT week_number, start_date, end_date, period, week_in_period,
           learning_phase, setting, intensity, weekly_hours, priorities
    FROM periodizations
    WHERE plan_id = ?
    ORDER BY week_number
    "#,
  )
  .bind(plan_id)
  .fetch_all(pool)
  .await?;

  let mut periodizations = Vec::with_capacity(week_rows.len());
  for row in &week_rows {
    let priorities: Vec<Priority> = parse_json(row, "priorities")?;
    periodizations.push(Periodization {
      week_number: row.try_get::<i64, _>("week_number")? as u32,
      start_date: parse_field(row, "start_date")?,
      end_date: parse_field(row, "end_date")?,
      period: parse_field(row, "period")?,
      week_in_period: row.try_get::<i64, _>("week_in_period")? as u32,
      learning_phase: parse_field(row, "learning_phase")?,
      setting: parse_field(row, "setting")?,
      intensity: parse_field(row, "intensity")?,
      weekly_hours: row.try_get("weekly_hours")?,
      priorities,
    });
  }

  let day_rows = sqlx::query(
    r#"
    SELECT assigned_date, week_number, day_of_week, session_type, estimated_duration,
           period, intensity, is_rest_day, is_optional
    FROM daily_assignments
    WHERE plan_id = ?
    ORDER BY assigned_date
    "#,
  )
  .bind(plan_id)
  .fetch_all(pool)
  .await?;

  let mut daily_assignments = Vec::with_capacity(day_rows.len());
  for row in &day_rows {
    let index = row.try_get::<i64, _>("day_of_week")?;
    let day_of_week = calendar::weekday_from_index(index as u8)
      .ok_or_else(|| StoreError::Corrupt(format!("day_of_week {}", index)))?;
    let session_type: Option<String> = row.try_get("session_type")?;
    let session_type: Option<SessionType> = session_type
      .map(|s| s.parse().map_err(StoreError::Corrupt))
      .transpose()?;

    daily_assignments.push(DailyAssignment {
      assigned_date: parse_field(row, "assigned_date")?,
      week_number: row.try_get::<i64, _>("week_number")? as u32,
      day_of_week,
      session_type,
      estimated_duration: row.try_get::<i64, _>("estimated_duration")? as u32,
      period: parse_field(row, "period")?,
      intensity: parse_field(row, "intensity")?,
      is_rest_day: row.try_get("is_rest_day")?,
      is_optional: row.try_get("is_optional")?,
    });
  }

  let tournament_rows = sqlx::query(
    r#"
    SELECT name, start_date, end_date, importance, week_number, topping_start_week,
           topping_duration_weeks, tapering_start_date, tapering_duration_days, focus_areas
    FROM scheduled_tournaments
    WHERE plan_id = ?
    ORDER BY start_date, name
    "#,
  )
  .bind(plan_id)
  .fetch_all(pool)
  .await?;

  let mut tournaments = Vec::with_capacity(tournament_rows.len());
  for row in &tournament_rows {
    let importance: Importance = parse_field(row, "importance")?;
    let topping_start_week: Option<i64> = row.try_get("topping_start_week")?;
    tournaments.push(ScheduledTournament {
      name: row.try_get("name")?,
      start_date: parse_field(row, "start_date")?,
      end_date: parse_field(row, "end_date")?,
      importance,
      week_number: row.try_get::<i64, _>("week_number")? as u32,
      topping_start_week: topping_start_week.map(|w| w as u32),
      topping_duration_weeks: row.try_get::<i64, _>("topping_duration_weeks")? as u32,
      tapering_start_date: parse_optional_date(row, "tapering_start_date")?,
      tapering_duration_days: row.try_get::<i64, _>("tapering_duration_days")? as u32,
      focus_areas: parse_json(row, "focus_areas")?,
    });
  }

  Ok(PlanRecord {
    plan,
    periodizations,
    daily_assignments,
    tournaments,
  })
}

/// The player's linked plan, if any
pub async fn load_current_plan(pool: &DbPool, player_id: &str) -> Result<Option<PlanRecord>, StoreError> {
  let id: Option<String> =
    sqlx::query_scalar("SELECT id FROM annual_training_plans WHERE player_id = ? AND linked = 1")
      .bind(player_id)
      .fetch_optional(pool)
      .await?;

  match id {
    Some(id) => Ok(Some(load_plan(pool, &id).await?)),
    None => Ok(None),
  }
}

/// ---------------------------------------------------------------------------
/// Lifecycle
/// ---------------------------------------------------------------------------

async fn current_status(pool: &DbPool, plan_id: &str) -> Result<PlanStatus, StoreError> {
  let status: Option<String> = sqlx::query_scalar("SELECT status FROM annual_training_plans WHERE id = ?")
    .bind(plan_id)
    .fetch_optional(pool)
    .await?;
  status
    .ok_or_else(|| StoreError::NotFound(plan_id.to_string()))?
    .parse()
    .map_err(StoreError::Corrupt)
}

/// Move a plan from `from` to `to`, failing if another writer got there first.
/// `extra_set` may reference `?2` (timestamp) and `?5` (reason, when given).
async fn transition(
  pool: &DbPool,
  plan_id: &str,
  from: PlanStatus,
  to: PlanStatus,
  extra_set: &str,
  reason: Option<&str>,
) -> Result<(), StoreError> {
  let now = Utc::now().to_rfc3339();
  let sql = format!(
    "UPDATE annual_training_plans SET status = ?1, updated_at = ?2{} WHERE id = ?3 AND status = ?4",
    extra_set
  );
  let mut query = sqlx::query(&sql)
    .bind(to.as_str())
    .bind(&now)
    .bind(plan_id)
    .bind(from.as_str());
  if let Some(reason) = reason {
    query = query.bind(reason);
  }
  let updated = query.execute(pool).await?.rows_affected();

  if updated == 0 {
    return Err(StoreError::Conflict(plan_id.to_string()));
  }
  info!(plan_id, from = %from, to = %to, "plan status changed");
  Ok(())
}

/// draft -> active
pub async fn accept_plan(pool: &DbPool, plan_id: &str) -> Result<PlanStatus, StoreError> {
  let from = current_status(pool, plan_id).await?;
  let to = from.accept()?;
  transition(pool, plan_id, from, to, ", accepted_at = ?2", None).await?;
  Ok(to)
}

/// draft | active -> archived, and unlink so the player can regenerate
pub async fn reject_plan(pool: &DbPool, plan_id: &str, reason: &str) -> Result<PlanStatus, StoreError> {
  let reason = reason.trim();
  if reason.chars().count() < MIN_REJECTION_REASON_LEN {
    return Err(StoreError::InvalidRequest(format!(
      "rejection reason must be at least {} characters",
      MIN_REJECTION_REASON_LEN
    )));
  }

  let from = current_status(pool, plan_id).await?;
  let to = from.reject()?;
  transition(
    pool,
    plan_id,
    from,
    to,
    ", rejected_at = ?2, linked = 0, rejection_reason = ?5",
    Some(reason),
  )
  .await?;
  Ok(to)
}

/// active -> completed. The finished season is unlinked so the next
/// generation keeps it as history instead of replacing it.
pub async fn complete_plan(pool: &DbPool, plan_id: &str) -> Result<PlanStatus, StoreError> {
  let from = current_status(pool, plan_id).await?;
  let to = from.complete()?;
  transition(pool, plan_id, from, to, ", completed_at = ?2, linked = 0", None).await?;
  Ok(to)
}

/// Record a modification request. The plan itself is left untouched; a
/// later regeneration replaces it wholesale.
pub async fn request_modification(
  pool: &DbPool,
  plan_id: &str,
  request: &ModificationRequest,
) -> Result<String, StoreError> {
  let concerns = request.cleaned_concerns();
  if concerns.is_empty() {
    return Err(StoreError::InvalidRequest("at least one concern is required".to_string()));
  }

  let status = current_status(pool, plan_id).await?;
  if !status.accepts_modification_requests() {
    return Err(LifecycleError::Closed(status).into());
  }

  let id = Uuid::new_v4().to_string();
  sqlx::query(
    r#"
    INSERT INTO plan_modification_requests (id, plan_id, concerns, notes, urgency)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
  )
  .bind(&id)
  .bind(plan_id)
  .bind(to_json(&concerns)?)
  .bind(request.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
  .bind(request.urgency.as_str())
  .execute(pool)
  .await?;

  info!(plan_id, request_id = %id, urgency = request.urgency.as_str(), "modification requested");
  Ok(id)
}

pub async fn list_modification_requests(
  pool: &DbPool,
  plan_id: &str,
) -> Result<Vec<StoredModificationRequest>, StoreError> {
  let rows = sqlx::query(
    r#"
    SELECT id, plan_id, concerns, notes, urgency, status, created_at
    FROM plan_modification_requests
    WHERE plan_id = ?
    ORDER BY created_at, id
    "#,
  )
  .bind(plan_id)
  .fetch_all(pool)
  .await?;

  rows
    .iter()
    .map(|row| {
      Ok(StoredModificationRequest {
        id: row.try_get("id")?,
        plan_id: row.try_get("plan_id")?,
        concerns: parse_json(row, "concerns")?,
        notes: row.try_get("notes")?,
        urgency: parse_field(row, "urgency")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
      })
    })
    .collect()
}
