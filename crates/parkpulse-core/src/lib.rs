//! parkpulse-core
//!
//! Park activity status: visitors report how busy an area is, and the
//! current status is a time-weighted average of recent reports.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（area, level, report, aggregator, errors）
//! - **ports**: 抽象化レイヤー（Clock, KeyValueStore, ReportReplicator, IdGenerator）
//! - **impls**: ports の実装（InMemoryStore, FileStore, HttpReplicator など）
//! - **reports**: エリアごとの ReportLog と永続化フォーマット
//! - **parking**: 駐車場の占有数
//! - **geo**: 公園のジオフェンス
//! - **hazards**: 危険報告とエリアアラート
//! - **config**: `parkpulse.toml`
//! - **app**: ParkPulseBuilder と ParkPulse（公開インターフェース）

pub mod app;
pub mod config;
pub mod domain;
pub mod geo;
pub mod hazards;
pub mod impls;
pub mod observability;
pub mod parking;
pub mod ports;
pub mod reports;

pub use app::{BuildError, ParkPulse, ParkPulseBuilder};
pub use config::{Config, ConfigError};
pub use domain::{ActivityLevel, ActivityReport, AreaKind, ErrorKind, ParkError, ReportId};
pub use observability::AreaStatusView;
