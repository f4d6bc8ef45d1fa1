//! Compression results, newest first.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::{load_json, save_json};
use crate::defaults;
use crate::error::Result;
use crate::models::ResultItem;
use crate::traits::KeyValueStore;

const RESULTS_KEY: &str = "results";

/// History of finished jobs, capped at the 50 most recent.
#[derive(Clone)]
pub struct ResultStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ResultStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<ResultItem>> {
        Ok(load_json(self.kv.as_ref(), RESULTS_KEY, "result_store")
            .await?
            .unwrap_or_default())
    }

    pub async fn add(&self, item: ResultItem) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        items.insert(0, item);
        items.truncate(defaults::RESULTS_MAX_ITEMS);
        save_json(self.kv.as_ref(), RESULTS_KEY, &items).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        items.retain(|i| i.id != id);
        save_json(self.kv.as_ref(), RESULTS_KEY, &items).await
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(RESULTS_KEY).await
    }
}
