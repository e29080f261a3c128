//! ActivityLevel - 混雑度の 3 段階
//!
//! Light / Medium / Busy の順序付きカテゴリ。ordinal は 1, 2, 3 で、
//! それ以外の値は境界で `InvalidLevel` として拒否する。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ParkError;

/// Crowd level reported by a visitor, and the derived status of an area.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    /// No-signal default.
    #[default]
    Light,
    Medium,
    Busy,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [Self::Light, Self::Medium, Self::Busy];

    /// Ordinal score used by the weighted average.
    pub fn score(self) -> f64 {
        f64::from(self.ordinal())
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Self::Light => 1,
            Self::Medium => 2,
            Self::Busy => 3,
        }
    }

    /// Lowercase wire name (`"light"`, `"medium"`, `"busy"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Light => "Light",
            Self::Medium => "Medium",
            Self::Busy => "Busy",
        };
        f.write_str(label)
    }
}

impl TryFrom<u8> for ActivityLevel {
    type Error = ParkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Light),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Busy),
            other => Err(ParkError::InvalidLevel(other.to_string())),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = ParkError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "medium" => Ok(Self::Medium),
            "busy" => Ok(Self::Busy),
            _ => Err(ParkError::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::title_case("Light", ActivityLevel::Light)]
    #[case::lowercase("medium", ActivityLevel::Medium)]
    #[case::uppercase("BUSY", ActivityLevel::Busy)]
    #[case::padded("  busy ", ActivityLevel::Busy)]
    fn parses_known_labels(#[case] input: &str, #[case] expected: ActivityLevel) {
        assert_eq!(input.parse::<ActivityLevel>().unwrap(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::unknown("packed")]
    #[case::numeric("2")]
    fn rejects_unknown_labels(#[case] input: &str) {
        let err = input.parse::<ActivityLevel>().unwrap_err();
        assert!(matches!(err, ParkError::InvalidLevel(_)));
    }

    #[test]
    fn ordinals_round_trip_and_out_of_range_is_rejected() {
        for level in ActivityLevel::ALL {
            assert_eq!(ActivityLevel::try_from(level.ordinal()).unwrap(), level);
        }
        assert!(matches!(
            ActivityLevel::try_from(0),
            Err(ParkError::InvalidLevel(v)) if v == "0"
        ));
        assert!(ActivityLevel::try_from(4).is_err());
    }

    #[test]
    fn levels_are_ordered_by_score() {
        assert!(ActivityLevel::Light < ActivityLevel::Medium);
        assert!(ActivityLevel::Medium < ActivityLevel::Busy);
        assert_eq!(ActivityLevel::Busy.score(), 3.0);
    }

    #[test]
    fn serializes_as_lowercase() {
        let json = serde_json::to_string(&ActivityLevel::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
