//! Constants for chat roles, request defaults and SVG element names
//!
//! This module defines string and numeric constants shared by the request
//! composer, the Azure provider and the markup post-processor.

/// Message role constants
pub mod role {
    /// User role identifier
    pub const USER: &str = "user";

    /// System role identifier
    pub const SYSTEM: &str = "system";
}

/// Defaults applied when the environment leaves a setting unset
pub mod defaults {
    /// Azure OpenAI REST API version
    pub const API_VERSION: &str = "2024-02-01";

    /// Sampling temperature, kept high enough for playful animations
    pub const TEMPERATURE: f32 = 0.6;

    /// Completion token ceiling
    pub const MAX_TOKENS: u32 = 4000;

    /// Outbound request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Server host address
    pub const HOST: &str = "127.0.0.1";

    /// Server port
    pub const PORT: u16 = 8501;

    /// Logging level
    pub const LOG_LEVEL: &str = "info";
}

/// Download constants for the generated file
pub mod download {
    /// File name offered to the browser
    pub const FILE_NAME: &str = "animated_graphic.svg";

    /// MIME type of the generated file
    pub const MIME: &str = "image/svg+xml";
}

/// SVG element names the post-processor cares about
pub mod svg {
    /// Root element name
    pub const ROOT: &str = "svg";

    /// SMIL animation elements counted during validation
    pub const ANIMATION_ELEMENTS: [&str; 4] = ["animate", "animateTransform", "animateMotion", "set"];

    /// Elements the model sometimes leaves open although they never carry content
    pub const VOID_ELEMENTS: [&str; 6] = [
        "animate",
        "animateTransform",
        "animateMotion",
        "set",
        "stop",
        "mpath",
    ];
}
