//! ReportReplicator port - リモートへのベストエフォート複製
//!
//! ローカルが常に優先。リモートへの送信は 1 回きりで、失敗しても
//! リトライしない（ログに残して捨てる）。
//!
//! # 実装
//! - NoopReplicator: 何もしない（リモート未設定時のデフォルト）
//! - HttpReplicator: REST エンドポイントへ insert / upsert

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, AreaKind, ReplicationError};

/// Remote row for one activity report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteActivityReport {
    #[serde(rename = "court_type")]
    pub area_type: AreaKind,
    pub status: ActivityLevel,
    pub created_at: DateTime<Utc>,
}

/// Remote row for a parking lot's occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteParkingUpdate {
    pub lot_id: String,
    pub occupied: u32,
    pub last_updated: DateTime<Utc>,
}

/// Optional remote copy of locally recorded data.
///
/// Callers spawn these and never await them on the submit path.
#[async_trait]
pub trait ReportReplicator: Send + Sync {
    async fn insert_report(&self, record: RemoteActivityReport) -> Result<(), ReplicationError>;

    async fn upsert_parking(&self, record: RemoteParkingUpdate) -> Result<(), ReplicationError>;
}
