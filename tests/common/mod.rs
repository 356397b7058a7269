#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use video_recipes::{Recipe, RecipeError, RecipeExtractor, VideoId};

/// Extractor with scripted per-id outcomes that counts every call.
///
/// Ids without a script resolve to a recipe titled `Recipe <id>`.
#[derive(Clone, Default)]
pub struct ScriptedExtractor {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    first_call_delay: Duration,
    scripts: Arc<Mutex<HashMap<String, Result<Recipe, RecipeError>>>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Only the first call is slow; later calls use the regular delay.
    pub fn with_first_call_delay(delay: Duration) -> Self {
        Self {
            first_call_delay: delay,
            ..Self::default()
        }
    }

    pub fn script(&self, id: &str, outcome: Result<Recipe, RecipeError>) {
        self.scripts.lock().unwrap().insert(id.to_string(), outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeExtractor for ScriptedExtractor {
    fn extractor_name(&self) -> &str {
        "scripted"
    }

    async fn extract(&self, video_id: &VideoId) -> Result<Recipe, RecipeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = if call == 0 && !self.first_call_delay.is_zero() {
            self.first_call_delay
        } else {
            self.delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.scripts.lock().unwrap().get(video_id.as_str()).cloned();
        scripted.unwrap_or_else(|| Ok(Recipe::new(video_id.clone(), format!("Recipe {}", video_id))))
    }
}

pub fn tomato_soup(id: &str) -> Recipe {
    Recipe::new(id, "Tomato Soup")
        .with_ingredients(["4 tomatoes", "1 onion", "2 cups stock"])
        .with_steps(["Chop the vegetables", "Simmer for 20 minutes", "Blend"])
}
