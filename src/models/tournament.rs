use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Importance {
  /// Season target: gets a topping block and a taper
  A,
  B,
  C,
}

impl Importance {
  pub fn as_str(&self) -> &'static str {
    match self {
      Importance::A => "A",
      Importance::B => "B",
      Importance::C => "C",
    }
  }

  pub fn focus_areas(&self) -> &'static [&'static str] {
    match self {
      Importance::A => &[
        "Mental preparation",
        "Course strategy",
        "Peak performance",
        "Recovery optimization",
      ],
      Importance::B => &["Competition readiness", "Mental skills", "Tactical preparation"],
      Importance::C => &["Competition exposure", "Performance habits"],
    }
  }
}

impl std::fmt::Display for Importance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Importance {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "A" | "a" => Ok(Importance::A),
      "B" | "b" => Ok(Importance::B),
      "C" | "c" => Ok(Importance::C),
      other => Err(format!("Unknown importance: {}", other)),
    }
  }
}

/// Tournament as entered on the season calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentInput {
  pub name: String,
  #[serde(alias = "date")]
  pub start_date: NaiveDate,
  /// Last day of play; single-day events may omit it
  #[serde(default)]
  pub end_date: Option<NaiveDate>,
  pub importance: Importance,
}

impl TournamentInput {
  pub fn new(name: impl Into<String>, start_date: NaiveDate, importance: Importance) -> Self {
    Self {
      name: name.into(),
      start_date,
      end_date: None,
      importance,
    }
  }

  pub fn last_day(&self) -> NaiveDate {
    self.end_date.unwrap_or(self.start_date)
  }
}

/// Tournament placed on the plan's week grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTournament {
  pub name: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub importance: Importance,
  pub week_number: u32,
  /// Only importance-A tournaments peak
  pub topping_start_week: Option<u32>,
  pub topping_duration_weeks: u32,
  pub tapering_start_date: Option<NaiveDate>,
  pub tapering_duration_days: u32,
  pub focus_areas: Vec<String>,
}

impl ScheduledTournament {
  pub fn is_peaking_target(&self) -> bool {
    self.importance == Importance::A
  }

  /// Inclusive week range from topping start to the tournament week
  pub fn taper_window(&self) -> Option<(u32, u32)> {
    self.topping_start_week.map(|start| (start, self.week_number))
  }

  /// Whether `date` falls in the tapering days leading into the event
  pub fn is_tapering_day(&self, date: NaiveDate) -> bool {
    match self.tapering_start_date {
      Some(taper_start) => date >= taper_start && date < self.start_date,
      None => false,
    }
  }
}
