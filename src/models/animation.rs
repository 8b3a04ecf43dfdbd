//! Animation request and result models
//!
//! These types travel through the pipeline and double as the JSON and
//! form bodies of the HTTP surface.

use serde::{Deserialize, Serialize};

/// One user submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationRequest {
    /// The static SVG the user pasted
    #[serde(alias = "svg")]
    pub original_markup: String,

    /// What the animation should look like
    #[serde(alias = "instructions")]
    pub instruction_text: String,

    /// What the graphic shows, used as context for the model
    #[serde(default, alias = "description")]
    pub subject_description: Option<String>,
}

impl AnimationRequest {
    pub fn new(original_markup: impl Into<String>, instruction_text: impl Into<String>) -> Self {
        Self {
            original_markup: original_markup.into(),
            instruction_text: instruction_text.into(),
            subject_description: None,
        }
    }

    pub fn with_subject(mut self, description: impl Into<String>) -> Self {
        self.subject_description = Some(description.into());
        self
    }

    /// Subject description, ignoring blank input
    pub fn subject(&self) -> Option<&str> {
        self.subject_description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Validated markup ready for preview and download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedMarkup {
    /// The SVG document
    pub svg: String,

    /// Number of elements in the document
    pub element_count: usize,

    /// Number of SMIL animation elements in the document
    pub animation_count: usize,

    /// Names of the substitution rules that changed the text
    pub applied_rules: Vec<String>,
}

/// JSON body returned by `POST /api/animate`
#[derive(Debug, Serialize)]
pub struct AnimateResponse {
    pub request_id: String,
    pub filename: &'static str,
    #[serde(flatten)]
    pub markup: CleanedMarkup,
}
