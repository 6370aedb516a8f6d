use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Period: macro-cycle block a week belongs to
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
  /// Assessment and planning (E)
  Evaluation,
  /// Broad foundational training (G)
  Base,
  /// Narrowing focus ahead of competition (S)
  Specialization,
  /// Competition weeks with reduced load (T)
  Tournament,
}

impl Period {
  pub const ALL: [Period; 4] = [
    Period::Evaluation,
    Period::Base,
    Period::Specialization,
    Period::Tournament,
  ];

  /// Single-letter code used by the academy's planning sheets
  pub fn code(&self) -> char {
    match self {
      Period::Evaluation => 'E',
      Period::Base => 'G',
      Period::Specialization => 'S',
      Period::Tournament => 'T',
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Period::Evaluation => "evaluation",
      Period::Base => "base",
      Period::Specialization => "specialization",
      Period::Tournament => "tournament",
    }
  }
}

impl std::fmt::Display for Period {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Period {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "E" | "e" | "evaluation" => Ok(Period::Evaluation),
      "G" | "g" | "base" => Ok(Period::Base),
      "S" | "s" | "specialization" => Ok(Period::Specialization),
      "T" | "t" | "tournament" => Ok(Period::Tournament),
      other => Err(format!("Unknown period: {}", other)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Learning Phase: L1 (gross motor patterns) .. L5 (automatic under pressure)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LearningPhase {
  L1 = 1,
  L2 = 2,
  L3 = 3,
  L4 = 4,
  L5 = 5,
}

impl LearningPhase {
  pub fn level(self) -> u8 {
    self as u8
  }

  pub fn from_level(level: u8) -> Option<Self> {
    match level {
      1 => Some(LearningPhase::L1),
      2 => Some(LearningPhase::L2),
      3 => Some(LearningPhase::L3),
      4 => Some(LearningPhase::L4),
      5 => Some(LearningPhase::L5),
      _ => None,
    }
  }
}

impl std::fmt::Display for LearningPhase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "L{}", self.level())
  }
}

impl std::str::FromStr for LearningPhase {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim()
      .strip_prefix('L')
      .and_then(|n| n.parse::<u8>().ok())
      .and_then(LearningPhase::from_level)
      .ok_or_else(|| format!("Unknown learning phase: {}", s))
  }
}

/// ---------------------------------------------------------------------------
/// Setting: environmental complexity S1 (controlled) .. S10 (competition)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Setting {
  S1 = 1,
  S2 = 2,
  S3 = 3,
  S4 = 4,
  S5 = 5,
  S6 = 6,
  S7 = 7,
  S8 = 8,
  S9 = 9,
  S10 = 10,
}

impl Setting {
  pub fn level(self) -> u8 {
    self as u8
  }

  pub fn from_level(level: u8) -> Option<Self> {
    match level {
      1 => Some(Setting::S1),
      2 => Some(Setting::S2),
      3 => Some(Setting::S3),
      4 => Some(Setting::S4),
      5 => Some(Setting::S5),
      6 => Some(Setting::S6),
      7 => Some(Setting::S7),
      8 => Some(Setting::S8),
      9 => Some(Setting::S9),
      10 => Some(Setting::S10),
      _ => None,
    }
  }
}

impl std::fmt::Display for Setting {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "S{}", self.level())
  }
}

impl std::str::FromStr for Setting {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.trim()
      .strip_prefix('S')
      .and_then(|n| n.parse::<u8>().ok())
      .and_then(Setting::from_level)
      .ok_or_else(|| format!("Unknown setting: {}", s))
  }
}

/// ---------------------------------------------------------------------------
/// Intensity Band
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityBand {
  Low,
  Medium,
  High,
  Peak,
  Taper,
}

impl IntensityBand {
  pub fn as_str(&self) -> &'static str {
    match self {
      IntensityBand::Low => "low",
      IntensityBand::Medium => "medium",
      IntensityBand::High => "high",
      IntensityBand::Peak => "peak",
      IntensityBand::Taper => "taper",
    }
  }

  /// 1-10 load score stored alongside daily assignments
  pub fn load_score(&self) -> u8 {
    match self {
      IntensityBand::Low => 3,
      IntensityBand::Medium => 5,
      IntensityBand::High => 7,
      IntensityBand::Peak => 9,
      IntensityBand::Taper => 4,
    }
  }
}

impl std::fmt::Display for IntensityBand {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for IntensityBand {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low" => Ok(IntensityBand::Low),
      "medium" => Ok(IntensityBand::Medium),
      "high" => Ok(IntensityBand::High),
      "peak" => Ok(IntensityBand::Peak),
      "taper" => Ok(IntensityBand::Taper),
      _ => Err(format!("Unknown intensity band: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Session Type / Priority vocabulary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
  Technical,
  Physical,
  Mental,
  Tactical,
  Recovery,
}

impl SessionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      SessionType::Technical => "technical",
      SessionType::Physical => "physical",
      SessionType::Mental => "mental",
      SessionType::Tactical => "tactical",
      SessionType::Recovery => "recovery",
    }
  }
}

impl std::fmt::Display for SessionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for SessionType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "technical" => Ok(SessionType::Technical),
      "physical" => Ok(SessionType::Physical),
      "mental" => Ok(SessionType::Mental),
      "tactical" => Ok(SessionType::Tactical),
      "recovery" => Ok(SessionType::Recovery),
      _ => Err(format!("Unknown session type: {}", s)),
    }
  }
}

/// One weighted entry of a week's priority list. Weights are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
  pub session_type: SessionType,
  pub weight: u8,
}

impl Priority {
  pub const fn new(session_type: SessionType, weight: u8) -> Self {
    Self { session_type, weight }
  }
}

const EVALUATION_PRIORITIES: [Priority; 4] = [
  Priority::new(SessionType::Technical, 35),
  Priority::new(SessionType::Physical, 25),
  Priority::new(SessionType::Mental, 20),
  Priority::new(SessionType::Recovery, 20),
];

const BASE_PRIORITIES: [Priority; 4] = [
  Priority::new(SessionType::Technical, 40),
  Priority::new(SessionType::Physical, 30),
  Priority::new(SessionType::Mental, 15),
  Priority::new(SessionType::Recovery, 15),
];

const SPECIALIZATION_PRIORITIES: [Priority; 4] = [
  Priority::new(SessionType::Technical, 35),
  Priority::new(SessionType::Physical, 25),
  Priority::new(SessionType::Mental, 20),
  Priority::new(SessionType::Tactical, 20),
];

const TOURNAMENT_PRIORITIES: [Priority; 4] = [
  Priority::new(SessionType::Tactical, 40),
  Priority::new(SessionType::Mental, 30),
  Priority::new(SessionType::Technical, 20),
  Priority::new(SessionType::Recovery, 10),
];

/// Weighted priority list for a period, highest weight first
pub fn priorities_for(period: Period) -> &'static [Priority] {
  match period {
    Period::Evaluation => &EVALUATION_PRIORITIES,
    Period::Base => &BASE_PRIORITIES,
    Period::Specialization => &SPECIALIZATION_PRIORITIES,
    Period::Tournament => &TOURNAMENT_PRIORITIES,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_period_codes_parse_back() {
    for period in Period::ALL {
      let parsed: Period = period.code().to_string().parse().unwrap();
      assert_eq!(parsed, period);
    }
    assert!("X".parse::<Period>().is_err());
  }

  #[test]
  fn test_learning_phase_parse() {
    assert_eq!("L3".parse::<LearningPhase>(), Ok(LearningPhase::L3));
    assert!("L6".parse::<LearningPhase>().is_err());
    assert!("3".parse::<LearningPhase>().is_err());
  }

  #[test]
  fn test_setting_parse_two_digits() {
    assert_eq!("S10".parse::<Setting>(), Ok(Setting::S10));
    assert_eq!(Setting::S10.to_string(), "S10");
    assert!("S0".parse::<Setting>().is_err());
  }

  #[test]
  fn test_priority_weights_sum_to_100() {
    for period in Period::ALL {
      let total: u32 = priorities_for(period).iter().map(|p| p.weight as u32).sum();
      assert_eq!(total, 100, "{} priorities", period);
    }
  }

  #[test]
  fn test_priorities_sorted_by_weight() {
    for period in Period::ALL {
      let weights: Vec<u8> = priorities_for(period).iter().map(|p| p.weight).collect();
      let mut sorted = weights.clone();
      sorted.sort_by(|a, b| b.cmp(a));
      assert_eq!(weights, sorted);
    }
  }

  #[test]
  fn test_priority_json_is_camel_case() {
    let json = serde_json::to_value(Priority::new(SessionType::Technical, 35)).unwrap();
    assert_eq!(json, serde_json::json!({ "sessionType": "technical", "weight": 35 }));
  }
}
