//! LLM Provider Clients
//!
//! Agents never talk to a provider directly. They receive an
//! `Arc<dyn LLMClient>` and call [`LLMClient::prompt`] with a fully built
//! prompt and the model identifier configured for that agent.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection built from `[provider]` in `itinera.toml`
//!
//! # Supported Providers
//!
//! - OpenAI-compatible HTTP endpoints (always available)
//! - `ollama` - Local Ollama server (Cargo feature, on by default)
//!
//! # Example
//!
//! ```ignore
//! use itinera::llm::Provider;
//!
//! let provider = Provider::from_config(&config.provider)?;
//! let client = provider.create_client()?;
//!
//! let body = client.prompt("Return {\"ok\": true}", "").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

/// OpenAI-compatible chat completion client.
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, OpenAISettings, Provider};
