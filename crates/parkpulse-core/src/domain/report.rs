//! ActivityReport - 混雑度レポート

use serde::{Deserialize, Serialize};

use super::{ActivityLevel, AreaKind, ReportId};

const MS_PER_MINUTE: f64 = 60_000.0;

/// ActivityReport は来園者 1 人分の混雑度の観測
///
/// 作成後は不変。編集・削除の操作はない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    id: ReportId,
    area: AreaKind,
    level: ActivityLevel,
    observed_at_ms: i64,
}

impl ActivityReport {
    pub fn new(id: ReportId, area: AreaKind, level: ActivityLevel, observed_at_ms: i64) -> Self {
        Self {
            id,
            area,
            level,
            observed_at_ms,
        }
    }

    pub fn id(&self) -> ReportId {
        self.id
    }

    pub fn area(&self) -> AreaKind {
        self.area
    }

    pub fn level(&self) -> ActivityLevel {
        self.level
    }

    pub fn observed_at_ms(&self) -> i64 {
        self.observed_at_ms
    }

    /// Age at `now_ms`. Negative when the report is stamped in the future.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.observed_at_ms)
    }

    pub fn age_minutes(&self, now_ms: i64) -> f64 {
        self.age_ms(now_ms) as f64 / MS_PER_MINUTE
    }
}
