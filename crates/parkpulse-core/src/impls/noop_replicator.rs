//! NoopReplicator - リモート未設定時のデフォルト

use async_trait::async_trait;

use crate::domain::ReplicationError;
use crate::ports::{RemoteActivityReport, RemoteParkingUpdate, ReportReplicator};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReplicator;

#[async_trait]
impl ReportReplicator for NoopReplicator {
    async fn insert_report(&self, _record: RemoteActivityReport) -> Result<(), ReplicationError> {
        Ok(())
    }

    async fn upsert_parking(&self, _record: RemoteParkingUpdate) -> Result<(), ReplicationError> {
        Ok(())
    }
}
