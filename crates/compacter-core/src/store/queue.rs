//! Compression queue persisted as a JSON list.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::{load_json, save_json};
use crate::defaults;
use crate::error::{Error, Result};
use crate::models::{CompressionPreset, QueueItem, QueueStats};
use crate::traits::KeyValueStore;

const QUEUE_KEY: &str = "queue_items";

/// Queue of videos waiting to be compressed.
///
/// Items are unique by URI: re-adding a URI replaces the stored entry but
/// keeps its id. The queue holds at most 100 items, dropping the oldest.
#[derive(Clone)]
pub struct QueueStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl QueueStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<QueueItem>> {
        Ok(load_json(self.kv.as_ref(), QUEUE_KEY, "queue_store")
            .await?
            .unwrap_or_default())
    }

    /// Add one item, replacing any entry with the same URI.
    pub async fn add(&self, item: QueueItem) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        if upsert(&mut items, item) {
            trim_oldest(&mut items);
        }
        save_json(self.kv.as_ref(), QUEUE_KEY, &items).await
    }

    /// Add several items with the same per-item semantics as [`add`](Self::add).
    pub async fn add_all(&self, new_items: Vec<QueueItem>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        for item in new_items {
            upsert(&mut items, item);
        }
        trim_oldest(&mut items);
        debug!(subsystem = "store", component = "queue_store", count = items.len(), "Queue updated");
        save_json(self.kv.as_ref(), QUEUE_KEY, &items).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        items.retain(|i| i.id != id);
        save_json(self.kv.as_ref(), QUEUE_KEY, &items).await
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(QUEUE_KEY).await
    }

    /// Change the target percentage of one item, clamped to 10..=100.
    pub async fn update_percentage(&self, id: &str, percentage: u8) -> Result<()> {
        let percentage = percentage.clamp(defaults::TARGET_PERCENT_MIN, defaults::TARGET_PERCENT_MAX);
        self.update_item(id, |item| item.target_percentage = Some(percentage))
            .await
    }

    /// Change the fallback preset of one item. A percentage, if set, still
    /// takes precedence.
    pub async fn update_preset(&self, id: &str, preset: CompressionPreset) -> Result<()> {
        self.update_item(id, |item| item.preset = preset).await
    }

    async fn update_item(&self, id: &str, update: impl FnOnce(&mut QueueItem)) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.list().await?;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("queue item {}", id)))?;
        update(item);
        save_json(self.kv.as_ref(), QUEUE_KEY, &items).await
    }

    /// Remove and return every queued item.
    pub async fn take_all(&self) -> Result<Vec<QueueItem>> {
        let _guard = self.write_lock.lock().await;
        let items = self.list().await?;
        self.kv.remove(QUEUE_KEY).await?;
        Ok(items)
    }

    pub async fn stats(&self) -> Result<QueueStats> {
        Ok(QueueStats::from_items(&self.list().await?))
    }
}

/// Replace by URI (keeping the old id) or append. Returns true on append.
fn upsert(items: &mut Vec<QueueItem>, item: QueueItem) -> bool {
    match items.iter_mut().find(|existing| existing.uri == item.uri) {
        Some(existing) => {
            let id = std::mem::take(&mut existing.id);
            *existing = QueueItem { id, ..item };
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}

fn trim_oldest(items: &mut Vec<QueueItem>) {
    if items.len() > defaults::QUEUE_MAX_ITEMS {
        let excess = items.len() - defaults::QUEUE_MAX_ITEMS;
        items.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn item(id: &str, uri: &str) -> QueueItem {
        QueueItem {
            id: id.to_string(),
            name: format!("{}.mp4", id),
            uri: uri.to_string(),
            size_bytes: 1_000,
            duration_ms: 10_000,
            target_percentage: Some(50),
            ..Default::default()
        }
    }

    fn store() -> QueueStore {
        QueueStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let queue = store();
        queue.add(item("a", "content://1")).await.unwrap();
        queue.add(item("b", "content://2")).await.unwrap();

        let items = queue.list().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[1].id, "b");
    }

    #[tokio::test]
    async fn test_readd_same_uri_keeps_id() {
        let queue = store();
        queue.add(item("a", "content://1")).await.unwrap();
        queue
            .add(item("z", "content://1").with_percentage(20))
            .await
            .unwrap();

        let items = queue.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].target_percentage, Some(20));
        assert_eq!(items[0].name, "z.mp4");
    }

    #[tokio::test]
    async fn test_add_all_caps_at_max_keeping_newest() {
        let queue = store();
        let batch: Vec<_> = (0..105)
            .map(|n| item(&n.to_string(), &format!("content://{}", n)))
            .collect();
        queue.add_all(batch).await.unwrap();

        let items = queue.list().await.unwrap();
        assert_eq!(items.len(), 100);
        assert_eq!(items[0].id, "5");
        assert_eq!(items[99].id, "104");
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let queue = store();
        queue
            .add_all(vec![item("a", "content://1"), item("b", "content://2")])
            .await
            .unwrap();

        queue.remove("a").await.unwrap();
        let items = queue.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");

        queue.clear().await.unwrap();
        assert!(queue.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_percentage_clamps() {
        let queue = store();
        queue.add(item("a", "content://1")).await.unwrap();

        queue.update_percentage("a", 5).await.unwrap();
        assert_eq!(queue.list().await.unwrap()[0].target_percentage, Some(10));

        let err = queue.update_percentage("missing", 30).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == "queue item missing"));
    }

    #[tokio::test]
    async fn test_update_preset() {
        let queue = store();
        queue
            .add_all(vec![item("a", "content://1"), item("b", "content://2")])
            .await
            .unwrap();

        queue
            .update_preset("b", CompressionPreset::ExtraSmall)
            .await
            .unwrap();
        let items = queue.list().await.unwrap();
        assert_eq!(items[0].preset, CompressionPreset::Balanced);
        assert_eq!(items[1].preset, CompressionPreset::ExtraSmall);
        assert_eq!(items[1].target_percentage, Some(50));

        let err = queue
            .update_preset("missing", CompressionPreset::Small)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_take_all_empties_queue() {
        let queue = store();
        queue.add(item("a", "content://1")).await.unwrap();

        let taken = queue.take_all().await.unwrap();
        assert_eq!(taken.len(), 1);
        assert!(queue.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let queue = store();
        queue.add(item("a", "content://1")).await.unwrap();
        queue
            .add(item("b", "content://2").with_percentage(10))
            .await
            .unwrap();

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.total_bytes, 2_000);
        assert_eq!(stats.estimated_bytes, 600);
        assert_eq!(stats.savings_percent, 70);
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(QUEUE_KEY, "garbage".to_string()).await.unwrap();
        let queue = QueueStore::new(kv);
        assert!(queue.list().await.unwrap().is_empty());

        queue.add(item("a", "content://1")).await.unwrap();
        assert_eq!(queue.list().await.unwrap().len(), 1);
    }
}
