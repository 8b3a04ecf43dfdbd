//! Markup post-processing
//!
//! Turns raw model output into validated SVG in three order-sensitive
//! steps: extract the markup block, apply the substitution table, then
//! validate. Nothing is returned unless validation passed.

pub mod extract;
pub mod substitutions;
pub mod validate;

use crate::models::animation::CleanedMarkup;
use thiserror::Error;
use tracing::debug;

pub use extract::extract_markup;
pub use substitutions::{SubstitutionRule, SubstitutionTable};
pub use validate::{DocumentStats, validate_svg};

/// Reasons raw model output could not be turned into usable SVG
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The model returned an empty response")]
    Empty,

    #[error("No <svg> element found in the model response")]
    NoMarkup,

    #[error("Malformed markup at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("Invalid attribute on <{element}>: {message}")]
    InvalidAttribute { element: String, message: String },

    #[error("Invalid entity or character reference at byte {position}: {reference:?}")]
    InvalidReference { position: u64, reference: String },

    #[error("Expected <svg> as the root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("More than one root element")]
    MultipleRoots,

    #[error("Text outside the root element")]
    ContentOutsideRoot,

    #[error("{0} element(s) left unclosed at end of document")]
    Unclosed(usize),
}

impl ValidationError {
    /// Short machine-readable code for JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Empty => "empty_response",
            ValidationError::NoMarkup => "no_markup",
            _ => "malformed_markup",
        }
    }
}

/// Clean and validate a raw model response
pub fn process(raw: &str, table: &SubstitutionTable) -> Result<CleanedMarkup, ValidationError> {
    let extracted = extract_markup(raw)?;
    let substituted = table.apply(extracted);
    if !substituted.applied.is_empty() {
        debug!("Substitution rules applied: {}", substituted.applied.join(", "));
    }

    let svg = substituted.text.trim().to_string();
    let stats = validate_svg(&svg)?;

    Ok(CleanedMarkup {
        svg,
        element_count: stats.element_count,
        animation_count: stats.animation_count,
        applied_rules: substituted.applied,
    })
}
