use crate::domain_port::*;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Token store persisted as a single JSON object on disk.
///
/// Survives process restarts the way browser local storage survives reloads.
/// Like local storage, every read goes to the file, and every batch re-reads
/// it before merging, so stores for different key sets can share one path.
/// Each batch rewrites the whole file through a temp file and a rename, so the
/// file always holds either the old or the new batch. Writes are serialized
/// within a process only; there is no cross-process file lock.
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Open `path`, failing early if an existing file is not a JSON object.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let entries = load(&path).await?;
        debug!(path = %path.display(), keys = entries.len(), "opened token store");

        Ok(FileTokenStore {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn load(path: &Path) -> Result<BTreeMap<String, String>, TokenStoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(load(&self.path).await?.remove(key))
    }

    async fn apply(&self, writes: Vec<StoreWrite>) -> Result<(), TokenStoreError> {
        let _guard = self.write_lock.lock().await;
        let current = load(&self.path).await?;
        let mut next = current.clone();
        for write in writes {
            match write {
                StoreWrite::Set { key, value } => {
                    next.insert(key, value);
                }
                StoreWrite::Remove { key } => {
                    next.remove(&key);
                }
            }
        }
        if next == current {
            return Ok(());
        }
        self.persist(&next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("system1.json");

        let store = FileTokenStore::open(&path).await.unwrap();
        store
            .apply(vec![
                StoreWrite::set("access_token", "A1"),
                StoreWrite::set("access_expires", "1700000000"),
            ])
            .await
            .unwrap();
        drop(store);

        let reopened = FileTokenStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("access_token").await.unwrap().as_deref(), Some("A1"));
        assert_eq!(
            reopened.get("access_expires").await.unwrap().as_deref(),
            Some("1700000000")
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::open(dir.path().join("absent.json")).await.unwrap();

        assert_eq!(store.get("access_token").await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn remove_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileTokenStore::open(&path).await.unwrap();
        store.set("oidc_state", "s1").await.unwrap();
        store.remove("oidc_state").await.unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[tokio::test]
    async fn stores_sharing_a_file_keep_each_others_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let system1 = FileTokenStore::open(&path).await.unwrap();
        let system2 = FileTokenStore::open(&path).await.unwrap();

        system2.set("access_token2", "B1").await.unwrap();
        system1.set("access_token", "A1").await.unwrap();
        system2.remove("refresh_token2").await.unwrap();

        assert_eq!(system1.get("access_token2").await.unwrap().as_deref(), Some("B1"));
        let reopened = FileTokenStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("access_token").await.unwrap().as_deref(), Some("A1"));
        assert_eq!(reopened.get("access_token2").await.unwrap().as_deref(), Some("B1"));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileTokenStore::open(&path).await.err().unwrap();
        assert!(matches!(err, TokenStoreError::Serialization(_)));
    }
}
