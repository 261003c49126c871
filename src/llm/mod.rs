//! LLM integration for the survey.
//!
//! `provider` holds the provider-neutral request/response types and the
//! `LlmProvider` trait; `openai` talks to an OpenAI-compatible
//! chat-completions endpoint.

pub mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(config.clone())?;
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(provider))
}
