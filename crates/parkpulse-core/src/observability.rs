//! Observability - ステータスの説明用ビュー
//!
//! CLI の `status --json` などで、なぜそのステータスなのかを示す。

use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, AreaKind};

/// Why an area currently shows the status it does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaStatusView {
    pub area: AreaKind,
    pub status: ActivityLevel,
    /// Reports inside the retention window.
    pub reports: usize,
    /// `None` when there is no signal and the status is the Light default.
    pub weighted_average: Option<f64>,
    pub newest_report_ms: Option<i64>,
    pub computed_at_ms: i64,
}
