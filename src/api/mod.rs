//! HTTP surface
//!
//! Router, handlers, HTML pages and JSON error responses.

pub mod endpoints;
pub mod error;
pub mod pages;
