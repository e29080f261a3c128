//! KeyValueStore port - 端末ローカルの永続ストア
//!
//! ローカルストアがこの端末にとっての正本（source of truth）。
//! エリアごとに 1 レコード、駐車場と危険報告にそれぞれ 1 レコードを保存する。
//!
//! # 実装
//! - InMemoryStore（テスト・開発用）
//! - FileStore（キーごとに JSON ファイル）

use async_trait::async_trait;

use crate::domain::StoreError;

/// Byte-oriented key-value persistence.
///
/// `get` returns `Ok(None)` for a key that was never written.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;
}
