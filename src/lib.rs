pub mod assembler;
pub mod calendar;
pub mod commands;
pub mod config;
pub mod daily;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod periods;
pub mod progression;
pub mod tournament;

#[cfg(test)]
pub mod test_utils;

pub use assembler::{generate, validate_plan, PlanAssembler, PlanResult};
pub use config::{AppConfig, PlanConfig, PlanConfigBuilder};
pub use error::{GenerationError, InvariantViolation, PlanWarning, ValidationError};

use clap::{Parser, Subcommand};
use db::AppState;
use models::{ModificationRequest, Urgency};
use serde::Serialize;
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "annual-plan", version, about = "Generate and manage annual golf training plans")]
struct Cli {
  /// Overrides DATABASE_URL
  #[arg(long, global = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Generate a plan from a JSON request file and store it as a draft
  Generate {
    #[arg(long, short)]
    request: PathBuf,
  },
  /// Accept a draft plan
  Accept { plan_id: String },
  /// Reject a plan so a new one can be generated
  Reject {
    plan_id: String,
    #[arg(long)]
    reason: String,
  },
  /// Mark an active plan as completed
  Complete { plan_id: String },
  /// Record a modification request against a plan
  RequestModification {
    plan_id: String,
    #[arg(long = "concern", required = true)]
    concerns: Vec<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long, default_value = "medium")]
    urgency: Urgency,
  },
  /// Print a plan by id, or the player's current plan
  Show {
    plan_id: Option<String>,
    #[arg(long, conflicts_with = "plan_id")]
    player: Option<String>,
  },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
  let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode output: {}", e))?;
  println!("{}", json);
  Ok(())
}

async fn dispatch(state: &AppState, app: &AppConfig, command: Command) -> Result<(), String> {
  match command {
    Command::Generate { request } => {
      let raw = std::fs::read_to_string(&request)
        .map_err(|e| format!("Failed to read {}: {}", request.display(), e))?;
      let request: commands::plan::GeneratePlanRequest =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid request file: {}", e))?;
      let response = commands::plan::generate_plan(state, app, request).await?;
      print_json(&response)
    }
    Command::Accept { plan_id } => print_json(&commands::plan::accept_plan(state, plan_id).await?),
    Command::Reject { plan_id, reason } => {
      print_json(&commands::plan::reject_plan(state, plan_id, reason).await?)
    }
    Command::Complete { plan_id } => print_json(&commands::plan::complete_plan(state, plan_id).await?),
    Command::RequestModification {
      plan_id,
      concerns,
      notes,
      urgency,
    } => {
      let request = ModificationRequest {
        concerns,
        notes,
        urgency,
      };
      print_json(&commands::plan::request_plan_modification(state, plan_id, request).await?)
    }
    Command::Show { plan_id, player } => match (plan_id, player) {
      (Some(plan_id), _) => print_json(&commands::plan::get_plan(state, plan_id).await?),
      (None, Some(player)) => print_json(&commands::plan::get_current_plan(state, player).await?),
      (None, None) => Err("Pass a plan id or --player".to_string()),
    },
  }
}

/// CLI entry point
pub fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  let mut app = AppConfig::from_env()?;
  if let Some(url) = cli.database_url {
    app.database_url = url;
  }

  logging::init(app.log_format)?;

  let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
  runtime.block_on(execute(app, cli.command))?;
  Ok(())
}

async fn execute(app: AppConfig, command: Command) -> Result<(), String> {
  let pool = db::initialize_db(&app.database_url)
    .await
    .map_err(|e| format!("Failed to initialize database: {}", e))?;
  let state = AppState { db: pool };

  let outcome = dispatch(&state, &app, command).await;
  state.db.close().await;
  if let Err(e) = &outcome {
    error!(error = %e, "command failed");
  }
  outcome
}
