use crate::llm::client::{LLMClient, OpenAISettings};
use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// System message sent with every prompt.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful travel planning assistant. Always respond with valid JSON when requested.";

/// Delay before retry number `attempt + 1`, doubling from `base`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Backoff handed to `async-openai`, which retries 429 and 5xx answers itself.
///
/// The elapsed-time budget is the sum of the first `max_retries` delays, so
/// `max_retries = 0` disables those retries.
fn rate_limit_backoff(settings: &OpenAISettings) -> ExponentialBackoff {
    let budget = (0..settings.max_retries)
        .map(|attempt| backoff_delay(settings.retry_backoff, attempt))
        .fold(Duration::ZERO, Duration::saturating_add);

    ExponentialBackoffBuilder::new()
        .with_initial_interval(settings.retry_backoff)
        .with_randomization_factor(0.0)
        .with_multiplier(2.0)
        .with_max_interval(budget.max(settings.retry_backoff))
        .with_max_elapsed_time(Some(budget))
        .build()
}

/// Connection failures and timeouts never reach the server's rate limiter,
/// so they are retried here rather than by `async-openai`.
fn is_transient(error: &OpenAIError) -> bool {
    matches!(error, OpenAIError::Reqwest(e) if e.is_timeout() || e.is_connect())
}

/// Client for OpenAI-compatible chat completion endpoints
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    settings: OpenAISettings,
}

impl OpenAIClient {
    pub fn new(settings: OpenAISettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        let config = OpenAIConfig::new()
            .with_api_key(settings.api_key.clone())
            .with_api_base(settings.api_base.trim_end_matches('/'));

        let client = Client::with_config(config)
            .with_http_client(http)
            .with_backoff(rate_limit_backoff(&settings));

        Ok(Self { client, settings })
    }

    fn build_request(&self, prompt: &str, model: &str) -> Result<CreateChatCompletionRequest> {
        let model = if model.trim().is_empty() {
            self.settings.default_model.as_str()
        } else {
            model
        };

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                    SYSTEM_PROMPT.to_string(),
                )),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    prompt.to_string(),
                )),
            ])
            .temperature(self.settings.temperature)
            .max_completion_tokens(self.settings.max_tokens);

        if self.settings.json_mode {
            args.response_format(ResponseFormat::JsonObject);
        }

        args.build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn prompt(&self, prompt: &str, model: &str) -> Result<String> {
        let request = self.build_request(prompt, model)?;
        debug!(prompt_chars = prompt.len(), model = %request.model, "Sending chat completion");

        let mut attempt = 0;
        let response = loop {
            match self.client.chat().create(request.clone()).await {
                Ok(response) => break response,
                Err(e) if is_transient(&e) && attempt < self.settings.max_retries => {
                    let backoff = backoff_delay(self.settings.retry_backoff, attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Retrying chat completion after transient error"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(AppError::LLM(format!("OpenAI API error: {}", e))),
            }
        };

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_base", &self.settings.api_base)
            .field("default_model", &self.settings.default_model)
            .finish()
    }
}
