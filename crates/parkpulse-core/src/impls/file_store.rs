//! FileStore - キーごとに 1 ファイルの KeyValueStore
//!
//! # 実装詳細
//! - `<root>/<key>.json` に保存（`:` は `-` に置き換え）
//! - 一時ファイル（NamedTempFile）に書いてから persist（途中で落ちても壊れない）
//! - 同期 I/O は spawn_blocking で実行

use async_trait::async_trait;
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::domain::StoreError;
use crate::ports::KeyValueStore;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9_-]` become `-`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

fn read_file(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs_err::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(format!("reading {}", path.display()), e)),
    }
}

fn io_error(context: String, source: std::io::Error) -> StoreError {
    StoreError::Io { context, source }
}

fn write_file_atomic(root: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    fs_err::create_dir_all(root).map_err(|e| io_error(format!("creating {}", root.display()), e))?;

    // 一時ファイル名は書き込みごとに一意
    let mut tmp = NamedTempFile::new_in(root)
        .map_err(|e| io_error(format!("creating temp file in {}", root.display()), e))?;
    tmp.write_all(bytes)
        .map_err(|e| io_error(format!("writing temp file for {}", path.display()), e))?;
    tmp.flush()
        .map_err(|e| io_error(format!("flushing temp file for {}", path.display()), e))?;
    tmp.persist(path)
        .map_err(|e| io_error(format!("replacing {}", path.display()), e.error))?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || read_file(&path))
            .await
            .map_err(|e| StoreError::Unavailable(format!("read task failed: {e}")))?
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let root = self.root.clone();
        let path = self.path_for(key);
        tokio::task::spawn_blocking(move || write_file_atomic(&root, &path, &bytes))
            .await
            .map_err(|e| StoreError::Unavailable(format!("write task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn keys_map_to_safe_file_names() {
        let store = FileStore::new("/data");
        assert_eq!(
            store.path_for("activity:futsal"),
            PathBuf::from("/data/activity-futsal.json")
        );
        assert_eq!(
            store.path_for("../escape"),
            PathBuf::from("/data/---escape.json")
        );
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("activity:basketball").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_creates_root_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let store = FileStore::new(&root);

        store.put("parking", b"{\"lot1\":3}".to_vec()).await.unwrap();

        let reopened = FileStore::new(&root);
        assert_eq!(
            reopened.get("parking").await.unwrap(),
            Some(b"{\"lot1\":3}".to_vec())
        );
        let leftovers: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("parking.json")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_on_one_dir_never_fail_a_write() {
        let dir = tempdir().unwrap();
        let a = FileStore::new(dir.path());
        let b = FileStore::new(dir.path());

        let mut writes = Vec::new();
        for i in 0..100u32 {
            for store in [a.clone(), b.clone()] {
                writes.push(tokio::spawn(async move {
                    store
                        .put("activity:futsal", format!("{{\"n\":{i}}}").into_bytes())
                        .await
                }));
            }
        }
        for write in writes {
            write.await.unwrap().unwrap();
        }

        let stored = a.get("activity:futsal").await.unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&stored).unwrap();
        assert!(doc["n"].as_u64().unwrap() < 100);
    }

    #[tokio::test]
    async fn unreadable_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        // A directory where the file should be.
        std::fs::create_dir(store.path_for("activity:futsal")).unwrap();
        let err = store.get("activity:futsal").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
