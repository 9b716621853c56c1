//! LLM client abstraction and provider selection
//!
//! Every agent talks to the model through [`LLMClient::prompt`], a single
//! text-in/text-out call. Providers differ only in transport:
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint, JSON mode
//! - **Ollama**: local inference through `ollama-rs` (feature `ollama`)

use crate::types::{AppError, Result};
use crate::utils::toml_config::ProviderConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// Implementations must be cheap to share: the coordinator hands one
/// `Arc<dyn LLMClient>` to every concurrently running agent.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Send a prompt to `model` and return the raw completion text.
    ///
    /// An empty `model` selects the provider's default model.
    async fn prompt(&self, prompt: &str, model: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    pub api_base: String,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub json_mode: bool,
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API or any compatible server (vLLM, LM Studio, OpenRouter, ...)
    OpenAI(OpenAISettings),

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     default_model: "llama3.2".to_string(),
    ///     timeout: Duration::from_secs(120),
    /// };
    /// ```
    Ollama {
        base_url: String,
        default_model: String,
        timeout: Duration,
    },
}

impl Provider {
    /// Build a provider from configuration, resolving secrets from the environment.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                default_model,
                temperature,
                max_tokens,
                timeout_secs,
                connect_timeout_secs,
                max_retries,
                retry_backoff_ms,
                json_mode,
            } => {
                let api_key = if api_key_env.is_empty() {
                    String::new()
                } else {
                    std::env::var(api_key_env).map_err(|_| {
                        AppError::Configuration(format!(
                            "Environment variable '{}' for the OpenAI API key is not set",
                            api_key_env
                        ))
                    })?
                };

                Ok(Provider::OpenAI(OpenAISettings {
                    api_key,
                    api_base: api_base.clone(),
                    default_model: default_model.clone(),
                    temperature: *temperature,
                    max_tokens: *max_tokens,
                    timeout: Duration::from_secs(*timeout_secs),
                    connect_timeout: Duration::from_secs(*connect_timeout_secs),
                    max_retries: *max_retries,
                    retry_backoff: Duration::from_millis(*retry_backoff_ms),
                    json_mode: *json_mode,
                }))
            }
            ProviderConfig::Ollama {
                base_url,
                default_model,
                timeout_secs,
            } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                default_model: default_model.clone(),
                timeout: Duration::from_secs(*timeout_secs),
            }),
        }
    }

    /// Create a shareable client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, or if the
    /// provider was compiled out (Ollama without the `ollama` feature).
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            Provider::OpenAI(settings) => Ok(Arc::new(super::openai::OpenAIClient::new(
                settings.clone(),
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                default_model,
                timeout,
            } => Ok(Arc::new(super::ollama::OllamaClient::new(
                base_url,
                default_model.clone(),
                *timeout,
            )?)),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { .. } => Err(AppError::Configuration(
                "Ollama provider requested but the 'ollama' feature is not enabled".to_string(),
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI(_) => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model used when an agent has no model of its own configured
    pub fn default_model(&self) -> &str {
        match self {
            Provider::OpenAI(settings) => &settings.default_model,
            Provider::Ollama { default_model, .. } => default_model,
        }
    }
}
