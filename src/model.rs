use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a source video. Equality is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        VideoId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VideoId {
    fn from(id: &str) -> Self {
        VideoId(id.to_string())
    }
}

impl From<String> for VideoId {
    fn from(id: String) -> Self {
        VideoId(id)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Structured recipe extracted from a video.
///
/// Produced once per extraction and never mutated afterwards; a re-extraction
/// yields a new value that replaces the old one in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub video_id: VideoId,
    pub title: String,
    /// One free-text line per ingredient, in source order
    pub ingredients: Vec<String>,
    /// Instruction steps, in order
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    /// Nutrient name to amount per serving, e.g. `"calories" -> 180.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<BTreeMap<String, f64>>,
}

impl Recipe {
    pub fn new(video_id: impl Into<VideoId>, title: impl Into<String>) -> Self {
        Recipe {
            video_id: video_id.into(),
            title: title.into(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            servings: None,
            prep_time: None,
            cook_time: None,
            nutritional_info: None,
        }
    }

    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    /// A recipe with no title and no content carries nothing worth caching.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.ingredients.is_empty() && self.steps.is_empty()
    }

    /// Render as plain text: title, ingredient list, numbered steps.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n", self.title);

        let meta: Vec<String> = [
            ("Servings", self.servings.as_deref()),
            ("Prep time", self.prep_time.as_deref()),
            ("Cook time", self.cook_time.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, v)))
        .collect();
        if !meta.is_empty() {
            out.push_str(&meta.join(" | "));
            out.push('\n');
        }

        if let Some(nutrition) = self.nutritional_info.as_ref().filter(|n| !n.is_empty()) {
            let facts: Vec<String> = nutrition
                .iter()
                .map(|(name, amount)| format!("{}: {}", name, amount))
                .collect();
            out.push_str(&format!("Nutrition: {}\n", facts.join(", ")));
        }

        out.push_str("\nIngredients:\n");
        for ingredient in &self.ingredients {
            out.push_str(&format!("- {}\n", ingredient));
        }

        out.push_str("\nSteps:\n");
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }

        out
    }
}

/// Ingredient as returned by the recipe backend.
#[derive(Debug, Clone, Deserialize)]
pub struct WireIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

/// Instruction step as returned by the recipe backend.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStep {
    pub step_number: u32,
    pub description: String,
}

/// Recipe body returned by the recipe backend.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRecipe {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<WireIngredient>,
    #[serde(default)]
    pub steps: Vec<WireStep>,
    pub servings: Option<String>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub nutritional_info: Option<BTreeMap<String, f64>>,
}

impl WireRecipe {
    /// Flatten into a [`Recipe`] for `video_id`.
    ///
    /// Ingredients become `"<quantity> <name>"` lines; steps are sorted by
    /// their step number (stable for duplicates).
    pub fn into_recipe(self, video_id: VideoId) -> Recipe {
        let ingredients = self
            .ingredients
            .into_iter()
            .map(|i| format!("{} {}", i.quantity.trim(), i.name.trim()).trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        let mut steps = self.steps;
        steps.sort_by_key(|s| s.step_number);

        Recipe {
            video_id,
            title: self.title.trim().to_string(),
            ingredients,
            steps: steps.into_iter().map(|s| s.description.trim().to_string()).collect(),
            servings: self.servings,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            nutritional_info: self.nutritional_info,
        }
    }
}
