//! ParkPulseBuilder - アプリケーションの構築とワイヤリング
//!
//! 設定を検証してから ports を組み立て、ローカルストアから状態を復元する。
//! 未指定の port は設定から既定の実装を選ぶ。

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::service::{ParkPulse, ReplicationTracker};
use crate::config::{Config, ConfigError};
use crate::domain::{ReplicationError, TimeDecayAggregator};
use crate::impls::{FileStore, HttpReplicator, NoopReplicator};
use crate::hazards::HazardLog;
use crate::parking::ParkingBoard;
use crate::ports::{Clock, KeyValueStore, ReportReplicator, SystemClock, UlidGenerator};
use crate::reports::ReportLog;

/// Upper bound on one remote replication attempt, on top of any transport timeout.
pub const DEFAULT_REPLICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up remote replication: {0}")]
    Remote(#[source] ReplicationError),
}

/// Builds a [`ParkPulse`].
///
/// # 使用例
/// ```ignore
/// let app = ParkPulseBuilder::new()
///     .config(config)
///     .store(Arc::new(InMemoryStore::new()))
///     .build()
///     .await?;
/// ```
pub struct ParkPulseBuilder {
    config: Config,
    store: Option<Arc<dyn KeyValueStore>>,
    replicator: Option<Arc<dyn ReportReplicator>>,
    clock: Option<Arc<dyn Clock>>,
    replication_timeout: Duration,
}

impl ParkPulseBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            store: None,
            replicator: None,
            clock: None,
            replication_timeout: DEFAULT_REPLICATION_TIMEOUT,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Local store. Defaults to a `FileStore` in `storage.data_dir`.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Remote copy. Defaults to `HttpReplicator` when `[remote]` is usable,
    /// otherwise `NoopReplicator`.
    pub fn replicator(mut self, replicator: Arc<dyn ReportReplicator>) -> Self {
        self.replicator = Some(replicator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn replication_timeout(mut self, timeout: Duration) -> Self {
        self.replication_timeout = timeout;
        self
    }

    /// Validate the configuration, wire the ports and restore local state.
    ///
    /// Unreadable local data does not fail the build; affected areas start empty.
    pub async fn build(self) -> Result<ParkPulse, BuildError> {
        self.config.validate()?;

        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => {
                let files = FileStore::new(self.config.storage.data_dir.clone());
                info!(data_dir = %files.root().display(), "using file store");
                Arc::new(files)
            }
        };

        let replicator: Arc<dyn ReportReplicator> = match self.replicator {
            Some(replicator) => replicator,
            None if self.config.remote.is_usable() => {
                info!(url = %self.config.remote.url, "remote replication enabled");
                Arc::new(HttpReplicator::new(&self.config.remote).map_err(BuildError::Remote)?)
            }
            None => Arc::new(NoopReplicator),
        };

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let policy = self.config.aggregation.policy();

        let log = ReportLog::load(Arc::clone(&store), policy.retention).await;
        let parking = ParkingBoard::load(Arc::clone(&store)).await;
        let hazards = HazardLog::load(store).await;

        Ok(ParkPulse {
            ids: Box::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
            log,
            parking,
            hazards,
            aggregator: TimeDecayAggregator::new(policy),
            replicator,
            geofence: self.config.park.geofence(),
            replications: ReplicationTracker::new(self.replication_timeout),
        })
    }
}

impl Default for ParkPulseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
