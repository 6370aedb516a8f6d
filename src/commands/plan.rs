//! Request handlers for annual plan generation and lifecycle
//!
//! Each handler takes the shared `AppState`, runs the engine or the store,
//! and flattens errors to strings for the caller.

use serde::{Deserialize, Serialize};

use crate::assembler::{self, PlanResult};
use crate::config::{AppConfig, PlanConfig, RawPlanConfig};
use crate::db::{self, AppState, PlanRecord};
use crate::models::{Category, ModificationRequest, PlanStatus, PlayerBaseline, TournamentInput};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
  pub baseline: PlayerBaseline,
  /// Category the plan trains toward; defaults to the player's current one
  #[serde(default)]
  pub target_category: Option<Category>,
  #[serde(default)]
  pub tournaments: Vec<TournamentInput>,
  pub config: RawPlanConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanResponse {
  pub plan_id: String,
  #[serde(flatten)]
  pub result: PlanResult,
}

/// Generate a plan and commit it as the player's current draft
pub async fn generate_plan(
  state: &AppState,
  app: &AppConfig,
  request: GeneratePlanRequest,
) -> Result<GeneratePlanResponse, String> {
  let config = PlanConfig::try_from(request.config.with_app_defaults(app))
    .map_err(|e| format!("Invalid plan config [{}]: {}", e.code(), e))?;
  let category = request.target_category.unwrap_or(request.baseline.category);

  let result = assembler::generate(&request.baseline, category, &request.tournaments, &config)
    .map_err(|e| format!("Failed to generate plan [{}]: {}", e.code(), e))?;

  let plan_id = db::save_plan(&state.db, &result)
    .await
    .map_err(|e| format!("Failed to save plan: {}", e))?;

  Ok(GeneratePlanResponse { plan_id, result })
}

/// Accept a draft plan
pub async fn accept_plan(state: &AppState, plan_id: String) -> Result<PlanStatus, String> {
  db::accept_plan(&state.db, &plan_id)
    .await
    .map_err(|e| format!("Failed to accept plan: {}", e))
}

/// Reject a plan and free the player for a new generation
pub async fn reject_plan(state: &AppState, plan_id: String, reason: String) -> Result<PlanStatus, String> {
  db::reject_plan(&state.db, &plan_id, &reason)
    .await
    .map_err(|e| format!("Failed to reject plan: {}", e))
}

/// Mark an active plan as finished
pub async fn complete_plan(state: &AppState, plan_id: String) -> Result<PlanStatus, String> {
  db::complete_plan(&state.db, &plan_id)
    .await
    .map_err(|e| format!("Failed to complete plan: {}", e))
}

/// Record a modification request; returns the request id
pub async fn request_plan_modification(
  state: &AppState,
  plan_id: String,
  request: ModificationRequest,
) -> Result<String, String> {
  db::request_modification(&state.db, &plan_id, &request)
    .await
    .map_err(|e| format!("Failed to record modification request: {}", e))
}

pub async fn get_plan(state: &AppState, plan_id: String) -> Result<PlanRecord, String> {
  db::load_plan(&state.db, &plan_id)
    .await
    .map_err(|e| format!("Failed to load plan: {}", e))
}

pub async fn get_current_plan(state: &AppState, player_id: String) -> Result<Option<PlanRecord>, String> {
  db::load_current_plan(&state.db, &player_id)
    .await
    .map_err(|e| format!("Failed to load current plan: {}", e))
}
