//! Provider implementations

pub mod azure;

pub use azure::AzureOpenAIProvider;
