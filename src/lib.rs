//! SVG animator
//!
//! Sends static SVG plus an animation description to Azure OpenAI, cleans
//! and validates the returned SMIL-animated SVG, and serves a small browser
//! UI around it.

pub mod api;
pub mod core;
pub mod markup;
pub mod models;
