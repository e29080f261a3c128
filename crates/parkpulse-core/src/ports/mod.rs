//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の協調者（ローカルストア、リモート、時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - ローカルストアが正本（source of truth）
//! - リモートはベストエフォートの複製先
//! - 時刻は Clock から取る（テストで差し替え可能）

pub mod clock;
pub mod id_generator;
pub mod key_value_store;
pub mod replicator;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::key_value_store::KeyValueStore;
pub use self::replicator::{RemoteActivityReport, RemoteParkingUpdate, ReportReplicator};
