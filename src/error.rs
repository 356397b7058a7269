use std::time::Duration;
use thiserror::Error;

use crate::model::VideoId;

/// Errors produced by the recipe cache and saved-recipe registry.
///
/// Cloneable so a single extraction failure can be handed to every caller
/// attached to the same request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    /// The identifier does not correspond to any extractable video
    #[error("No recipe found for video '{0}'")]
    NotFound(VideoId),

    /// The extraction service could not produce a recipe
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// Extraction did not complete within the bound
    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    /// Saved-set storage could not be read or written
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

/// Errors raised while assembling a [`crate::RecipeContext`].
#[derive(Error, Debug)]
pub enum ContextError {
    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// HTTP client could not be created
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
