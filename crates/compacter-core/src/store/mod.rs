//! Durable stores for queue items, results and user settings.
//!
//! Each typed store keeps one JSON document under a fixed key of a
//! [`KeyValueStore`]. Mutations are read-modify-write cycles serialized by a
//! per-store mutex, so concurrent callers never lose each other's updates.
//! A payload that fails to parse is logged and treated as empty rather than
//! poisoning the store.

mod queue;
mod results;
mod settings;

pub use queue::QueueStore;
pub use results::ResultStore;
pub use settings::SettingsStore;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::traits::KeyValueStore;

/// In-memory [`KeyValueStore`], for tests and hosts without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Load a JSON document; missing or unparsable payloads yield `None`.
async fn load_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
    component: &'static str,
) -> Result<Option<T>> {
    let Some(raw) = kv.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(
                subsystem = "store",
                component,
                key,
                error = %e,
                "Discarding unparsable stored payload"
            );
            Ok(None)
        }
    }
}

async fn save_json<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    kv.set(key, raw).await
}
