mod http;

pub use http::HttpExtractor;

use async_trait::async_trait;

use crate::error::RecipeError;
use crate::model::{Recipe, VideoId};

/// Unified trait for anything that can turn a video into a recipe
///
/// The cache treats every implementation as an opaque asynchronous
/// operation: any error it returns is recorded as a failed entry.
#[async_trait]
pub trait RecipeExtractor: Send + Sync {
    /// Get the extractor name (e.g., "http")
    fn extractor_name(&self) -> &str;

    /// Extract the recipe for `video_id`
    async fn extract(&self, video_id: &VideoId) -> Result<Recipe, RecipeError>;
}
