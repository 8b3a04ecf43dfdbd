//! Core application modules
//!
//! This module contains configuration, constants, logging, the request
//! composer, the provider client and the animation pipeline.

pub mod animator;
pub mod config;
pub mod constants;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod providers;
