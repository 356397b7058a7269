use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{default_language, ExtractorConfig};
use crate::error::{ContextError, RecipeError};
use crate::extractors::RecipeExtractor;
use crate::model::{Recipe, VideoId, WireRecipe};

const SCRAPE_PATH: &str = "/scrape_video_id";

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    id: &'a str,
    language: &'a str,
}

/// Error body of the recipe service, e.g. `{"detail": "Video not found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Extractor backed by the recipe service's HTTP API
///
/// Posts `{"id": ..., "language": ...}` to `{base_url}/scrape_video_id` and
/// flattens the returned recipe document. The service answers 404 when the
/// video or its transcript is missing and 500 when no recipe could be
/// generated.
pub struct HttpExtractor {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
    request_timeout: Duration,
}

impl HttpExtractor {
    /// Create a new HTTP extractor from configuration
    pub fn new(config: &ExtractorConfig) -> Result<Self, ContextError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("VIDEO_RECIPES_API_KEY").ok());

        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent("Mozilla/5.0 (compatible; VideoRecipes/0.3)")
            .build()?;

        Ok(HttpExtractor {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
            request_timeout,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        HttpExtractor {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            language: default_language(),
            request_timeout: Duration::from_secs(90),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RecipeError {
        if err.is_timeout() {
            RecipeError::Timeout(self.request_timeout)
        } else {
            RecipeError::ExtractionFailed(err.to_string())
        }
    }
}

#[async_trait]
impl RecipeExtractor for HttpExtractor {
    fn extractor_name(&self) -> &str {
        "http"
    }

    async fn extract(&self, video_id: &VideoId) -> Result<Recipe, RecipeError> {
        if video_id.as_str().trim().is_empty() {
            return Err(RecipeError::NotFound(video_id.clone()));
        }

        // The id travels in the body so it reaches the service verbatim
        let body = ScrapeRequest {
            id: video_id.as_str(),
            language: &self.language,
        };
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, SCRAPE_PATH))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(RecipeError::NotFound(video_id.clone())),
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                let detail = serde_json::from_str::<ErrorBody>(&text)
                    .map(|body| body.detail)
                    .unwrap_or_else(|_| text.trim().to_string());
                return Err(RecipeError::ExtractionFailed(format!(
                    "recipe service returned {}: {}",
                    status, detail
                )));
            }
            _ => {}
        }

        let wire: WireRecipe = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RecipeError::Timeout(self.request_timeout)
            } else {
                RecipeError::ExtractionFailed(format!("malformed recipe body: {}", e))
            }
        })?;
        debug!("{:?}", wire);

        let recipe = wire.into_recipe(video_id.clone());
        if recipe.is_empty() {
            return Err(RecipeError::ExtractionFailed(format!(
                "no recipe could be derived from video '{}'",
                video_id
            )));
        }

        Ok(recipe)
    }
}
