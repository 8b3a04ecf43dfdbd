//! API data models
//!
//! This module contains data structures for the Azure OpenAI chat API and
//! for the service's own request/response types.

pub mod animation;
pub mod openai;
