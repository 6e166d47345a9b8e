use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::future::Cache;

use crate::config::CacheConfig;
use crate::domain::Category;
use crate::error::AppResult;

/// Cached hierarchy read models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryView {
    Roots,
    Forest,
}

type Entry = (u64, Arc<Vec<Category>>);

/// Read-through cache for hierarchy views.
///
/// Entries are stamped with the generation current when their load started.
/// `invalidate` bumps the generation, so a load that raced a write is never served.
pub struct CategoryCache {
    entries: Cache<CategoryView, Entry>,
    generation: AtomicU64,
}

impl CategoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.ttl())
                .build(),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn get_or_load<F, Fut>(
        &self,
        view: CategoryView,
        load: F,
    ) -> AppResult<Arc<Vec<Category>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<Category>>>,
    {
        let generation = self.generation.load(Ordering::Acquire);
        if let Some((stamp, cached)) = self.entries.get(&view).await {
            if stamp == generation {
                return Ok(cached);
            }
        }

        let loaded = Arc::new(load().await?);
        self.entries
            .insert(view, (generation, loaded.clone()))
            .await;
        Ok(loaded)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate_all();
    }
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
