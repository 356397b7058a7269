use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::builder::RecipeContextBuilder;
use crate::cache::{CacheEntry, RecipeCache};
use crate::cold_start::{ColdStartNotice, ColdStartSignal};
use crate::config::ContextConfig;
use crate::error::{ContextError, RecipeError};
use crate::model::{Recipe, VideoId};
use crate::saved::SavedRegistry;

/// A saved id paired with whatever the cache currently holds for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecipe {
    pub video_id: VideoId,
    pub entry: Option<CacheEntry>,
}

/// Session-scoped recipe state shared by every view.
///
/// Owns the recipe cache, the saved-recipe registry and the cold-start
/// signal. Views hold clones of the context and only ever see snapshots.
#[derive(Clone)]
pub struct RecipeContext {
    cache: RecipeCache,
    saved: Arc<SavedRegistry>,
    cold_start: Arc<ColdStartSignal>,
}

impl RecipeContext {
    /// Create a new builder
    ///
    /// # Example
    /// ```no_run
    /// use video_recipes::{HttpExtractor, RecipeContext};
    ///
    /// let context = RecipeContext::builder()
    ///     .extractor(HttpExtractor::with_base_url("http://localhost:8000"))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn builder() -> RecipeContextBuilder {
        RecipeContextBuilder::default()
    }

    /// Build a context entirely from configuration.
    pub fn from_config(config: ContextConfig) -> Result<Self, ContextError> {
        Self::builder().config(config).build()
    }

    pub(crate) fn from_parts(
        cache: RecipeCache,
        saved: SavedRegistry,
        cold_start: Arc<ColdStartSignal>,
    ) -> Self {
        Self {
            cache,
            saved: Arc::new(saved),
            cold_start,
        }
    }

    pub fn cache(&self) -> &RecipeCache {
        &self.cache
    }

    pub fn saved(&self) -> &SavedRegistry {
        &self.saved
    }

    pub async fn get_or_fetch(&self, video_id: &VideoId) -> Result<Recipe, RecipeError> {
        self.cache.get_or_fetch(video_id).await
    }

    pub async fn get_or_fetch_with_timeout(
        &self,
        video_id: &VideoId,
        timeout: Duration,
    ) -> Result<Recipe, RecipeError> {
        self.cache.get_or_fetch_with_timeout(video_id, timeout).await
    }

    pub async fn refresh(&self, video_id: &VideoId) -> Result<Recipe, RecipeError> {
        self.cache.refresh(video_id).await
    }

    pub fn peek(&self, video_id: &VideoId) -> Option<CacheEntry> {
        self.cache.peek(video_id)
    }

    pub fn invalidate(&self, video_id: &VideoId) -> bool {
        self.cache.invalidate(video_id)
    }

    pub fn save(&self, video_id: &VideoId) {
        self.saved.save(video_id)
    }

    pub fn unsave(&self, video_id: &VideoId) {
        self.saved.unsave(video_id)
    }

    pub fn toggle_saved(&self, video_id: &VideoId) -> bool {
        self.saved.toggle(video_id)
    }

    pub fn is_saved(&self, video_id: &VideoId) -> bool {
        self.saved.is_saved(video_id)
    }

    pub fn list(&self) -> Vec<VideoId> {
        self.saved.list()
    }

    /// Saved ids in order, each with its current cache state. Never fetches.
    pub fn saved_recipes(&self) -> Vec<SavedRecipe> {
        self.saved
            .list()
            .into_iter()
            .map(|video_id| SavedRecipe {
                entry: self.cache.peek(&video_id),
                video_id,
            })
            .collect()
    }

    /// Fetch every saved recipe concurrently and report the outcomes in
    /// saved order. Ready entries are served from the cache.
    pub async fn fetch_saved(&self) -> Vec<SavedRecipe> {
        let ids = self.saved.list();
        let results = join_all(ids.iter().map(|id| self.cache.get_or_fetch(id))).await;

        ids.into_iter()
            .zip(results)
            .map(|(video_id, result)| SavedRecipe {
                video_id,
                entry: Some(match result {
                    Ok(recipe) => CacheEntry::Ready(recipe),
                    Err(err) => CacheEntry::Failed(err),
                }),
            })
            .collect()
    }

    pub fn subscribe_cold_start(&self) -> broadcast::Receiver<ColdStartNotice> {
        self.cold_start.subscribe()
    }
}
