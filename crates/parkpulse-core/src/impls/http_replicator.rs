//! HttpReplicator - REST テーブルへの insert / upsert
//!
//! PostgREST 互換のエンドポイント（`<url>/rest/v1/<table>`）に JSON で送る。
//! 1 回きりの送信で、タイムアウトを超えたら諦める。

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::domain::ReplicationError;
use crate::ports::{RemoteActivityReport, RemoteParkingUpdate, ReportReplicator};

pub struct HttpReplicator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    reports_table: String,
    parking_table: String,
    timeout: Duration,
}

impl HttpReplicator {
    pub fn new(config: &RemoteConfig) -> Result<Self, ReplicationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReplicationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            reports_table: config.reports_table.clone(),
            parking_table: config.parking_table.clone(),
            timeout,
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        table: &str,
        prefer: &str,
        body: &T,
    ) -> Result<(), ReplicationError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReplicationError::Timeout(self.timeout)
                } else {
                    ReplicationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplicationError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReportReplicator for HttpReplicator {
    async fn insert_report(&self, record: RemoteActivityReport) -> Result<(), ReplicationError> {
        self.send(&self.reports_table, "return=minimal", &record)
            .await
    }

    async fn upsert_parking(&self, record: RemoteParkingUpdate) -> Result<(), ReplicationError> {
        self.send(
            &self.parking_table,
            "resolution=merge-duplicates,return=minimal",
            &record,
        )
        .await
    }
}
