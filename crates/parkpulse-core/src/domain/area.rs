//! AreaKind - レポート対象エリアの固定カテゴリ
//!
//! エリアごとに独立した ReportLog を持つ。エリア間の集約は行わない。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ParkError;

/// A fixed category of space in the park that receives its own activity reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaKind {
    Pickleball,
    Basketball,
    Futsal,
    Volleyball,
    Parking,
}

impl AreaKind {
    pub const ALL: [AreaKind; 5] = [
        Self::Pickleball,
        Self::Basketball,
        Self::Futsal,
        Self::Volleyball,
        Self::Parking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pickleball => "pickleball",
            Self::Basketball => "basketball",
            Self::Futsal => "futsal",
            Self::Volleyball => "volleyball",
            Self::Parking => "parking",
        }
    }

    /// Key of the durable record holding this area's report log.
    pub fn storage_key(self) -> String {
        format!("activity:{}", self.as_str())
    }
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaKind {
    type Err = ParkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == wanted)
            .ok_or_else(|| ParkError::UnknownArea(s.to_string()))
    }
}
