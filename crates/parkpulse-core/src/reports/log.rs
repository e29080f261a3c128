//! ReportLog - エリアごとの時間制限付きレポート履歴
//!
//! # 実装詳細
//! - 書き込み時に prune（retention より古いものを落とす）
//! - snapshot は読み取りのみ（ログを変更しない）
//! - 永続化の失敗はログに残すだけで、メモリ上の追記は取り消さない

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::codec;
use crate::domain::{ActivityReport, AreaKind};
use crate::ports::KeyValueStore;

/// AppendOutcome は 1 回の `append` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// prune 後に残った件数（新しいレポートを含む）
    pub retained: usize,
    /// この書き込みで prune された件数
    pub pruned: usize,
    /// Whether the durable write succeeded. The in-memory log is updated either way.
    pub persisted: bool,
}

/// ReportLog はエリアごとの追記専用ログ
///
/// # 並行性
/// - 読み取り（`snapshot`）は await しない。メモリ上の map だけを見る
/// - 書き込みは `write_gate` で直列化する。1 回の prune・追記・永続化が終わってから次に進むので、
///   保存順とメモリ上の順序が一致する
/// - prune は遅延。古いレポートはそのエリアへの次の書き込みで落ちる
pub struct ReportLog {
    store: Arc<dyn KeyValueStore>,
    retention_ms: i64,
    areas: RwLock<HashMap<AreaKind, Vec<ActivityReport>>>,
    write_gate: Mutex<()>,
}

impl ReportLog {
    /// An empty log. Nothing is read from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        Self {
            store,
            retention_ms: i64::try_from(retention.as_millis()).unwrap_or(i64::MAX),
            areas: RwLock::new(HashMap::new()),
            write_gate: Mutex::new(()),
        }
    }

    /// `store` から全エリアのログを復元
    ///
    /// 読めない・デコードできないエリアは空で始める。
    pub async fn load(store: Arc<dyn KeyValueStore>, retention: Duration) -> Self {
        let log = Self::new(store, retention);
        let mut restored = HashMap::new();

        for area in AreaKind::ALL {
            let key = area.storage_key();
            let bytes = match log.store.get(&key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%area, error = %err, "failed to read report log; starting empty");
                    continue;
                }
            };
            match codec::decode(area, &bytes) {
                Ok(Some(reports)) => {
                    debug!(%area, count = reports.len(), "restored report log");
                    restored.insert(area, reports);
                }
                Ok(None) => {
                    warn!(%area, "report log has a newer format version; starting empty");
                }
                Err(err) => {
                    warn!(%area, error = %err, "failed to decode report log; starting empty");
                }
            }
        }

        *log.write_areas() = restored;
        log
    }

    /// Append `report` to its area, prune entries older than the retention
    /// window as of `now_ms`, and persist the result.
    ///
    /// Persistence failures are logged and reported in the outcome; they never
    /// undo the in-memory append.
    pub async fn append(&self, report: ActivityReport, now_ms: i64) -> AppendOutcome {
        let _gate = self.write_gate.lock().await;
        let area = report.area();

        let (retained, pruned) = {
            let mut areas = self.write_areas();
            let reports = areas.entry(area).or_default();

            let at = reports.partition_point(|r| r.observed_at_ms() <= report.observed_at_ms());
            reports.insert(at, report);

            let before = reports.len();
            reports.retain(|r| r.age_ms(now_ms) <= self.retention_ms);
            (reports.clone(), before - reports.len())
        };

        debug!(%area, retained = retained.len(), pruned, "appended activity report");

        let persisted = match self.persist(area, &retained).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%area, error = %err, "failed to persist report log; keeping in-memory state");
                false
            }
        };

        AppendOutcome {
            retained: retained.len(),
            pruned,
            persisted,
        }
    }

    async fn persist(
        &self,
        area: AreaKind,
        reports: &[ActivityReport],
    ) -> Result<(), crate::domain::StoreError> {
        let bytes = codec::encode(reports)?;
        self.store.put(&area.storage_key(), bytes).await
    }

    /// Reports for `area` no older than the retention window at `now_ms`,
    /// in chronological order. Does not modify the log.
    pub fn snapshot(&self, area: AreaKind, now_ms: i64) -> Vec<ActivityReport> {
        self.read_areas()
            .get(&area)
            .map(|reports| {
                reports
                    .iter()
                    .filter(|r| r.age_ms(now_ms) <= self.retention_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of reports held for `area`, stale ones included.
    pub fn stored_len(&self, area: AreaKind) -> usize {
        self.read_areas().get(&area).map_or(0, Vec::len)
    }

    fn read_areas(&self) -> RwLockReadGuard<'_, HashMap<AreaKind, Vec<ActivityReport>>> {
        self.areas.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_areas(&self) -> RwLockWriteGuard<'_, HashMap<AreaKind, Vec<ActivityReport>>> {
        self.areas.write().unwrap_or_else(|e| e.into_inner())
    }
}
