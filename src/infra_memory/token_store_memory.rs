use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        match self.entries.read() {
            Ok(lock) => lock.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let entries = self.entries.read().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn apply(&self, writes: Vec<StoreWrite>) -> Result<(), TokenStoreError> {
        let mut entries = self.entries.write().map_err(|_| TokenStoreError::Poisoned)?;
        for write in writes {
            match write {
                StoreWrite::Set { key, value } => {
                    entries.insert(key, value);
                }
                StoreWrite::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
