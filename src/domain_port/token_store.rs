/// One mutation in a batch passed to [`TokenStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StoreWrite {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        StoreWrite::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        StoreWrite::Remove { key: key.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Persistent string key-value storage for session state.
///
/// Pure storage: values are not validated here.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;

    /// Apply every write or none of them. Readers never see a partial batch.
    async fn apply(&self, writes: Vec<StoreWrite>) -> Result<(), TokenStoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        self.apply(vec![StoreWrite::set(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        self.apply(vec![StoreWrite::remove(key)]).await
    }
}
