//! Session-scoped recipe state for video recipe extraction.
//!
//! A [`RecipeContext`] turns video ids into structured [`Recipe`]s through a
//! deduplicating [`RecipeCache`], and tracks the user's saved recipes in an
//! ordered [`SavedRegistry`] that can be persisted to a local file.

pub mod builder;
pub mod cache;
pub mod cold_start;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod model;
pub mod saved;
pub mod storage;

pub use builder::RecipeContextBuilder;
pub use cache::{CacheEntry, RecipeCache};
pub use cold_start::{ColdStartNotice, ColdStartSignal};
pub use config::ContextConfig;
pub use context::{RecipeContext, SavedRecipe};
pub use error::{ContextError, RecipeError};
pub use extractors::{HttpExtractor, RecipeExtractor};
pub use model::{Recipe, VideoId};
pub use saved::SavedRegistry;
pub use storage::{FileStore, MemoryStore, SavedStore};

/// Fetch one recipe through a context built from [`ContextConfig::load`].
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = video_recipes::fetch_recipe("UYhKDweME3A").await?;
/// println!("{}", recipe.title);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_recipe(video_id: &str) -> Result<Recipe, Box<dyn std::error::Error>> {
    let context = RecipeContext::from_config(ContextConfig::load()?)?;
    Ok(context.get_or_fetch(&VideoId::from(video_id)).await?)
}
