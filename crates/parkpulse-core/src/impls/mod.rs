//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: 開発・テスト用の KeyValueStore
//! - **FileStore**: キーごとに JSON ファイルを置く KeyValueStore
//! - **NoopReplicator**: リモート未設定時の ReportReplicator
//! - **HttpReplicator**: REST テーブルへ送る ReportReplicator

pub mod file_store;
pub mod http_replicator;
pub mod inmem_store;
pub mod noop_replicator;

// 主要な型を再エクスポート
pub use self::file_store::FileStore;
pub use self::http_replicator::HttpReplicator;
pub use self::inmem_store::InMemoryStore;
pub use self::noop_replicator::NoopReplicator;
