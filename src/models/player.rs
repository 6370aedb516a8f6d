use serde::{Deserialize, Serialize};

/// Competitive category A (elite) .. K (starter), banded by scoring average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
  A,
  B,
  C,
  D,
  E,
  F,
  G,
  H,
  I,
  J,
  K,
}

impl Category {
  pub const ALL: [Category; 11] = [
    Category::A,
    Category::B,
    Category::C,
    Category::D,
    Category::E,
    Category::F,
    Category::G,
    Category::H,
    Category::I,
    Category::J,
    Category::K,
  ];

  /// Category for an 18-hole scoring average
  pub fn from_scoring_average(average: f64) -> Self {
    let rounded = average.round();
    match rounded {
      s if s < 70.0 => Category::A,
      s if s <= 72.0 => Category::B,
      s if s <= 75.0 => Category::C,
      s if s <= 78.0 => Category::D,
      s if s <= 81.0 => Category::E,
      s if s <= 84.0 => Category::F,
      s if s <= 87.0 => Category::G,
      s if s <= 90.0 => Category::H,
      s if s <= 93.0 => Category::I,
      s if s <= 96.0 => Category::J,
      _ => Category::K,
    }
  }

  /// Inclusive weekly training hour band for players targeting this category
  pub fn weekly_hours_range(&self) -> (f64, f64) {
    match self {
      Category::A => (6.0, 30.0),
      Category::B => (5.0, 28.0),
      Category::C => (4.0, 26.0),
      Category::D => (4.0, 25.0),
      Category::E => (3.0, 22.0),
      Category::F => (3.0, 20.0),
      Category::G => (2.0, 18.0),
      Category::H => (2.0, 16.0),
      Category::I => (2.0, 14.0),
      Category::J => (2.0, 12.0),
      Category::K => (2.0, 10.0),
    }
  }

  pub fn min_weekly_hours(&self) -> f64 {
    self.weekly_hours_range().0
  }

  pub fn max_weekly_hours(&self) -> f64 {
    self.weekly_hours_range().1
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::A => "A",
      Category::B => "B",
      Category::C => "C",
      Category::D => "D",
      Category::E => "E",
      Category::F => "F",
      Category::G => "G",
      Category::H => "H",
      Category::I => "I",
      Category::J => "J",
      Category::K => "K",
    }
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for Category {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Category::ALL
      .iter()
      .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
      .copied()
      .ok_or_else(|| format!("Unknown category: {}", s))
  }
}

/// Baseline measurements captured at intake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBaseline {
  pub player_id: String,
  pub average_score: f64,
  pub handicap: Option<f64>,
  pub driver_speed: Option<f64>,
  /// Category the player currently plays in
  pub category: Category,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_category_from_scoring_average() {
    assert_eq!(Category::from_scoring_average(68.4), Category::A);
    assert_eq!(Category::from_scoring_average(71.0), Category::B);
    assert_eq!(Category::from_scoring_average(74.6), Category::C);
    assert_eq!(Category::from_scoring_average(80.0), Category::E);
    assert_eq!(Category::from_scoring_average(96.0), Category::J);
    assert_eq!(Category::from_scoring_average(104.0), Category::K);
  }

  #[test]
  fn test_hour_bands_narrow_with_category() {
    let maxima: Vec<f64> = Category::ALL.iter().map(|c| c.max_weekly_hours()).collect();
    assert!(maxima.windows(2).all(|w| w[0] >= w[1]));
    for c in Category::ALL {
      assert!(c.min_weekly_hours() < c.max_weekly_hours());
    }
  }

  #[test]
  fn test_category_parse_case_insensitive() {
    assert_eq!("c".parse::<Category>(), Ok(Category::C));
    assert!("Z".parse::<Category>().is_err());
  }
}
