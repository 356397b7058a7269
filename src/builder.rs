use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{RecipeCache, DEFAULT_EXTRACTION_TIMEOUT};
use crate::cold_start::ColdStartSignal;
use crate::config::ContextConfig;
use crate::context::RecipeContext;
use crate::error::ContextError;
use crate::extractors::{HttpExtractor, RecipeExtractor};
use crate::saved::SavedRegistry;
use crate::storage::{FileStore, SavedStore};

/// Builder for assembling a [`RecipeContext`]
///
/// Explicit settings win over anything taken from [`ContextConfig`].
#[derive(Default)]
pub struct RecipeContextBuilder {
    extractor: Option<Arc<dyn RecipeExtractor>>,
    store: Option<Box<dyn SavedStore>>,
    timeout: Option<Duration>,
    cold_start_idle: Option<Duration>,
    config: Option<ContextConfig>,
}

impl RecipeContextBuilder {
    /// Set the extraction collaborator
    ///
    /// # Example
    /// ```
    /// use video_recipes::{HttpExtractor, RecipeContext};
    ///
    /// let builder = RecipeContext::builder()
    ///     .extractor(HttpExtractor::with_base_url("http://localhost:8000"));
    /// ```
    pub fn extractor(mut self, extractor: impl RecipeExtractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Set an extractor that is also held elsewhere
    pub fn shared_extractor(mut self, extractor: Arc<dyn RecipeExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Persist the saved list in `store` and rehydrate from it on build
    ///
    /// # Example
    /// ```
    /// use video_recipes::{FileStore, RecipeContext};
    ///
    /// let builder = RecipeContext::builder()
    ///     .store(FileStore::new("saved.json"));
    /// ```
    pub fn store(mut self, store: impl SavedStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Set the default bound on a single extraction
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Re-arm the cold-start notice after this much idle time
    pub fn cold_start_idle(mut self, duration: Duration) -> Self {
        self.cold_start_idle = Some(duration);
        self
    }

    /// Fill unset options from configuration
    ///
    /// Without an explicit extractor an [`HttpExtractor`] is built from
    /// `config.extractor`; without an explicit store a [`FileStore`] is used
    /// when `config.storage.path` is set.
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Assemble the context
    ///
    /// # Errors
    /// Returns `ContextError` if no extractor was given and none can be
    /// built from configuration.
    pub fn build(self) -> Result<RecipeContext, ContextError> {
        let config = self.config;

        let extractor: Arc<dyn RecipeExtractor> = match (self.extractor, &config) {
            (Some(extractor), _) => extractor,
            (None, Some(config)) => Arc::new(HttpExtractor::new(&config.extractor)?),
            (None, None) => {
                return Err(ContextError::BuilderError(
                    "No extractor specified. Use .extractor() or .config()".to_string(),
                ))
            }
        };

        let store = self.store.or_else(|| {
            config
                .as_ref()
                .and_then(|c| FileStore::from_config(&c.storage))
                .map(|s| Box::new(s) as Box<dyn SavedStore>)
        });

        let timeout = self
            .timeout
            .or_else(|| config.as_ref().map(ContextConfig::extraction_timeout))
            .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT);
        if timeout.is_zero() {
            return Err(ContextError::BuilderError(
                "Extraction timeout must be greater than zero".to_string(),
            ));
        }

        let idle = self
            .cold_start_idle
            .or_else(|| config.as_ref().and_then(ContextConfig::cold_start_idle));

        debug!(
            "Building recipe context with '{}' extractor, timeout {:?}, persistence {}",
            extractor.extractor_name(),
            timeout,
            if store.is_some() { "on" } else { "off" }
        );

        let cold_start = Arc::new(ColdStartSignal::new(idle));
        let cache = RecipeCache::with_options(extractor, Arc::clone(&cold_start), timeout);
        let saved = match store {
            Some(store) => SavedRegistry::with_store(store),
            None => SavedRegistry::new(),
        };

        Ok(RecipeContext::from_parts(cache, saved, cold_start))
    }
}
