use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::player::Category;
use super::training::{IntensityBand, LearningPhase, Period, Priority, SessionType, Setting};

/// ---------------------------------------------------------------------------
/// Plan Status: draft -> active -> completed, or -> archived on reject
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
  #[default]
  Draft,
  Active,
  Completed,
  Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum LifecycleError {
  #[error("Cannot accept plan in status '{0}'. Only draft plans can be accepted.")]
  NotDraft(PlanStatus),

  #[error("Cannot complete plan in status '{0}'. Only active plans can be completed.")]
  NotActive(PlanStatus),

  #[error("Plan is already {0}")]
  Closed(PlanStatus),
}

impl PlanStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlanStatus::Draft => "draft",
      PlanStatus::Active => "active",
      PlanStatus::Completed => "completed",
      PlanStatus::Archived => "archived",
    }
  }

  pub fn accept(self) -> Result<PlanStatus, LifecycleError> {
    match self {
      PlanStatus::Draft => Ok(PlanStatus::Active),
      other => Err(LifecycleError::NotDraft(other)),
    }
  }

  pub fn reject(self) -> Result<PlanStatus, LifecycleError> {
    match self {
      PlanStatus::Draft | PlanStatus::Active => Ok(PlanStatus::Archived),
      other => Err(LifecycleError::Closed(other)),
    }
  }

  pub fn complete(self) -> Result<PlanStatus, LifecycleError> {
    match self {
      PlanStatus::Active => Ok(PlanStatus::Completed),
      other => Err(LifecycleError::NotActive(other)),
    }
  }

  /// Modification requests are only recorded against plans still in play
  pub fn accepts_modification_requests(&self) -> bool {
    matches!(self, PlanStatus::Draft | PlanStatus::Active)
  }
}

impl std::fmt::Display for PlanStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for PlanStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(PlanStatus::Draft),
      "active" => Ok(PlanStatus::Active),
      "completed" => Ok(PlanStatus::Completed),
      "archived" => Ok(PlanStatus::Archived),
      _ => Err(format!("Unknown plan status: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Plan records
/// ---------------------------------------------------------------------------

/// Plan header. Ids are assigned by the store at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualTrainingPlan {
  pub player_id: String,
  pub plan_name: String,
  pub start_date: NaiveDate,
  /// Exclusive
  pub end_date: NaiveDate,
  pub status: PlanStatus,
  pub baseline_average_score: f64,
  pub baseline_handicap: Option<f64>,
  pub baseline_driver_speed: Option<f64>,
  pub category: Category,
  pub weekly_hours_target: f64,
  pub evaluation_weeks: u32,
  pub base_period_weeks: u32,
  pub specialization_weeks: u32,
  pub tournament_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Periodization {
  pub week_number: u32,
  pub start_date: NaiveDate,
  /// Exclusive; equals the next week's start date
  pub end_date: NaiveDate,
  pub period: Period,
  pub week_in_period: u32,
  pub learning_phase: LearningPhase,
  pub setting: Setting,
  pub intensity: IntensityBand,
  pub weekly_hours: f64,
  pub priorities: Vec<Priority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAssignment {
  pub assigned_date: NaiveDate,
  pub week_number: u32,
  pub day_of_week: Weekday,
  pub session_type: Option<SessionType>,
  /// Minutes
  pub estimated_duration: u32,
  pub period: Period,
  pub intensity: IntensityBand,
  pub is_rest_day: bool,
  pub is_optional: bool,
}

impl DailyAssignment {
  pub fn rest(
    assigned_date: NaiveDate,
    week_number: u32,
    period: Period,
    intensity: IntensityBand,
  ) -> Self {
    Self {
      assigned_date,
      week_number,
      day_of_week: chrono::Datelike::weekday(&assigned_date),
      session_type: None,
      estimated_duration: 0,
      period,
      intensity,
      is_rest_day: true,
      is_optional: false,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Modification requests
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
  Low,
  #[default]
  Medium,
  High,
}

impl Urgency {
  pub fn as_str(&self) -> &'static str {
    match self {
      Urgency::Low => "low",
      Urgency::Medium => "medium",
      Urgency::High => "high",
    }
  }
}

impl std::str::FromStr for Urgency {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(Urgency::Low),
      "medium" => Ok(Urgency::Medium),
      "high" => Ok(Urgency::High),
      _ => Err(format!("Unknown urgency: {}", s)),
    }
  }
}

/// Player or coach asking for changes before (or after) accepting a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationRequest {
  pub concerns: Vec<String>,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub urgency: Urgency,
}

impl ModificationRequest {
  /// Non-blank concerns, trimmed
  pub fn cleaned_concerns(&self) -> Vec<String> {
    self
      .concerns
      .iter()
      .map(|c| c.trim().to_string())
      .filter(|c| !c.is_empty())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accept_only_from_draft() {
    assert_eq!(PlanStatus::Draft.accept(), Ok(PlanStatus::Active));
    assert_eq!(
      PlanStatus::Active.accept(),
      Err(LifecycleError::NotDraft(PlanStatus::Active))
    );
    assert!(PlanStatus::Archived.accept().is_err());
  }

  #[test]
  fn test_reject_archives_open_plans() {
    assert_eq!(PlanStatus::Draft.reject(), Ok(PlanStatus::Archived));
    assert_eq!(PlanStatus::Active.reject(), Ok(PlanStatus::Archived));
    assert_eq!(
      PlanStatus::Archived.reject(),
      Err(LifecycleError::Closed(PlanStatus::Archived))
    );
  }

  #[test]
  fn test_complete_requires_active() {
    assert_eq!(PlanStatus::Active.complete(), Ok(PlanStatus::Completed));
    assert!(PlanStatus::Draft.complete().is_err());
  }

  #[test]
  fn test_modification_request_defaults() {
    let json = r#"{"concerns":["  too many hours ", ""]}"#;
    let request: ModificationRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.urgency, Urgency::Medium);
    assert_eq!(request.cleaned_concerns(), vec!["too many hours".to_string()]);
  }

  #[test]
  fn test_status_string_roundtrip() {
    for status in [
      PlanStatus::Draft,
      PlanStatus::Active,
      PlanStatus::Completed,
      PlanStatus::Archived,
    ] {
      assert_eq!(status.as_str().parse::<PlanStatus>(), Ok(status));
    }
  }
}
