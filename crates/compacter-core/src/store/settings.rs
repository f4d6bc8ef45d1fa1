//! User preferences.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::{load_json, save_json};
use crate::defaults;
use crate::error::Result;
use crate::models::{SortOrder, UserSettings};
use crate::traits::KeyValueStore;

const SETTINGS_KEY: &str = "settings";

/// Persistent [`UserSettings`]. Missing fields read back as defaults.
#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load(&self) -> Result<UserSettings> {
        Ok(load_json(self.kv.as_ref(), SETTINGS_KEY, "settings_store")
            .await?
            .unwrap_or_default())
    }

    /// Persist settings, clamping `max_parallel_tasks` to the supported range.
    pub async fn save(&self, settings: UserSettings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(settings).await
    }

    async fn write(&self, mut settings: UserSettings) -> Result<()> {
        settings.max_parallel_tasks = settings.clamped_parallel_tasks();
        save_json(self.kv.as_ref(), SETTINGS_KEY, &settings).await
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut UserSettings),
    {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.load().await?;
        apply(&mut settings);
        self.write(settings).await
    }

    pub async fn set_show_resolution(&self, show: bool) -> Result<()> {
        self.update(|s| s.show_resolution = show).await
    }

    pub async fn set_max_selection(&self, max: u32) -> Result<()> {
        self.update(|s| s.max_selection = max).await
    }

    pub async fn set_onboarding_completed(&self) -> Result<()> {
        self.update(|s| s.onboarding_completed = true).await
    }

    pub async fn set_grid_view(&self, is_grid: bool) -> Result<()> {
        self.update(|s| s.is_grid_view = is_grid).await
    }

    pub async fn set_sort_order(&self, order: SortOrder) -> Result<()> {
        self.update(|s| s.sort_order = order).await
    }

    pub async fn set_use_hevc(&self, use_hevc: bool) -> Result<()> {
        self.update(|s| s.use_hevc = use_hevc).await
    }

    /// Clamped to 1..=3.
    pub async fn set_max_parallel_tasks(&self, max: usize) -> Result<()> {
        self.update(|s| s.max_parallel_tasks = max.clamp(1, defaults::JOB_MAX_PARALLEL_LIMIT))
            .await
    }
}
