//! Hazards - 危険・不審・メンテナンス報告とエリアアラート
//!
//! # ルール
//! - 説明文は trim 後に空なら拒否（`EmptyDescription`）
//! - 場所が空なら "Not specified"
//! - `alert` はエリア必須。エリアごとに直近 24 時間分を名前でまとめて返す
//! - 報告はレビュー用の記録なので prune しない
//!
//! 永続化は `hazards` キーに 1 ドキュメント。読めなければ空で始める。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{AreaKind, ParkError, ReportId, StoreError};
use crate::ports::KeyValueStore;

/// Storage key of the hazard record.
pub const HAZARDS_KEY: &str = "hazards";

/// アラートを表示する期間
pub const ALERT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_LOCATION: &str = "Not specified";

const HAZARDS_FORMAT_VERSION: u32 = 1;

/// HazardKind は報告の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Suspicious,
    Hazard,
    Maintenance,
    Other,
    /// エリアに紐づく短期のアラート（"Slippery courts" など）
    Alert,
}

impl HazardKind {
    pub const ALL: [HazardKind; 5] = [
        HazardKind::Suspicious,
        HazardKind::Hazard,
        HazardKind::Maintenance,
        HazardKind::Other,
        HazardKind::Alert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suspicious => "suspicious",
            Self::Hazard => "hazard",
            Self::Maintenance => "maintenance",
            Self::Other => "other",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardKind {
    type Err = ParkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParkError::UnknownHazardKind(s.to_string()))
    }
}

/// 定型アラート
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub areas: &'static [AreaKind],
}

pub const ALERT_PRESETS: &[AlertPreset] = &[
    AlertPreset {
        id: "cold-sand",
        name: "Cold sand",
        areas: &[AreaKind::Volleyball],
    },
    AlertPreset {
        id: "slippery",
        name: "Slippery courts",
        areas: &[AreaKind::Pickleball, AreaKind::Basketball, AreaKind::Futsal],
    },
    AlertPreset {
        id: "no-lights",
        name: "No lights",
        areas: &[
            AreaKind::Volleyball,
            AreaKind::Pickleball,
            AreaKind::Basketball,
            AreaKind::Futsal,
        ],
    },
];

pub fn find_preset(id: &str) -> Option<&'static AlertPreset> {
    ALERT_PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

/// `area` で使える定型アラート
pub fn applicable_alerts(area: AreaKind) -> Vec<&'static AlertPreset> {
    ALERT_PRESETS
        .iter()
        .filter(|p| p.areas.contains(&area))
        .collect()
}

/// 検証前の入力
#[derive(Debug, Clone, PartialEq)]
pub struct HazardDraft {
    pub kind: HazardKind,
    pub description: String,
    pub location: Option<String>,
    pub area: Option<AreaKind>,
}

impl HazardDraft {
    /// 入力を検証して保存できる報告にする
    pub fn validate(self, id: ReportId, observed_at_ms: i64) -> Result<HazardReport, ParkError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ParkError::EmptyDescription);
        }
        if self.kind == HazardKind::Alert && self.area.is_none() {
            return Err(ParkError::MissingArea);
        }

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION);

        Ok(HazardReport {
            id,
            kind: self.kind,
            alert_name: (self.kind == HazardKind::Alert).then(|| description.to_string()),
            description: description.to_string(),
            location: location.to_string(),
            area: self.area,
            observed_at_ms,
        })
    }
}

/// 保存済みの報告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    pub id: ReportId,
    pub kind: HazardKind,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub area: Option<AreaKind>,
    #[serde(default)]
    pub alert_name: Option<String>,
    pub observed_at_ms: i64,
}

impl HazardReport {
    fn alert_key(&self) -> &str {
        self.alert_name.as_deref().unwrap_or(&self.description)
    }
}

/// 名前ごとにまとめたアラート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAlert {
    pub name: String,
    pub count: usize,
    pub latest_ms: i64,
}

/// Alerts for `area` no older than [`ALERT_WINDOW`] at `now_ms`, grouped by
/// name, newest group first.
pub fn group_alerts(reports: &[HazardReport], area: AreaKind, now_ms: i64) -> Vec<AreaAlert> {
    let window_ms = i64::try_from(ALERT_WINDOW.as_millis()).unwrap_or(i64::MAX);
    let mut grouped: HashMap<&str, AreaAlert> = HashMap::new();

    for report in reports.iter().filter(|r| {
        r.kind == HazardKind::Alert
            && r.area == Some(area)
            && now_ms.saturating_sub(r.observed_at_ms) <= window_ms
    }) {
        let entry = grouped
            .entry(report.alert_key())
            .or_insert_with(|| AreaAlert {
                name: report.alert_key().to_string(),
                count: 0,
                latest_ms: report.observed_at_ms,
            });
        entry.count += 1;
        entry.latest_ms = entry.latest_ms.max(report.observed_at_ms);
    }

    let mut alerts: Vec<AreaAlert> = grouped.into_values().collect();
    alerts.sort_by(|a, b| b.latest_ms.cmp(&a.latest_ms).then_with(|| a.name.cmp(&b.name)));
    alerts
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredHazards {
    version: u32,
    #[serde(default)]
    reports: Vec<HazardReport>,
}

/// HazardLog は全報告を保持（追記のみ）
pub struct HazardLog {
    store: Arc<dyn KeyValueStore>,
    reports: RwLock<Vec<HazardReport>>,
    write_gate: Mutex<()>,
}

impl HazardLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            reports: RwLock::new(Vec::new()),
            write_gate: Mutex::new(()),
        }
    }

    /// `store` から復元。読めなければ空で始める。
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let log = Self::new(store);
        let restored = match log.store.get(HAZARDS_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<StoredHazards>(&bytes) {
                Ok(doc) if doc.version <= HAZARDS_FORMAT_VERSION => doc.reports,
                Ok(doc) => {
                    warn!(version = doc.version, "hazard record has a newer format; starting empty");
                    Vec::new()
                }
                Err(err) => {
                    warn!(error = %err, "failed to decode hazard record; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read hazard record; starting empty");
                Vec::new()
            }
        };
        *log.reports.write().unwrap_or_else(|e| e.into_inner()) = restored;
        log
    }

    /// 追記して永続化。永続化の失敗はログのみ。
    pub async fn append(&self, report: HazardReport) {
        let _gate = self.write_gate.lock().await;
        let all = {
            let mut reports = self.reports.write().unwrap_or_else(|e| e.into_inner());
            reports.push(report);
            reports.clone()
        };
        debug!(total = all.len(), "appended hazard report");

        if let Err(err) = self.persist(all).await {
            warn!(error = %err, "failed to persist hazard record; keeping in-memory state");
        }
    }

    async fn persist(&self, reports: Vec<HazardReport>) -> Result<(), StoreError> {
        let doc = StoredHazards {
            version: HAZARDS_FORMAT_VERSION,
            reports,
        };
        let bytes = serde_json::to_vec(&doc).map_err(|source| StoreError::Codec {
            context: "encoding hazard record".to_string(),
            source,
        })?;
        self.store.put(HAZARDS_KEY, bytes).await
    }

    pub fn reports(&self) -> Vec<HazardReport> {
        self.reports.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn alerts(&self, area: AreaKind, now_ms: i64) -> Vec<AreaAlert> {
        let reports = self.reports.read().unwrap_or_else(|e| e.into_inner());
        group_alerts(&reports, area, now_ms)
    }
}
