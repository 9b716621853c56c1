//! Mock implementations for testing.
//!
//! Shared model clients used by the integration tests so no test needs a
//! running model server.

use async_trait::async_trait;
use itinera::llm::LLMClient;
use itinera::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Prompt fragments that identify each agent's prompt.
pub mod prompts {
    pub const FLIGHT: &str = "flight search assistant";
    pub const HOTEL: &str = "hotel search assistant";
    pub const TRANSPORT: &str = "transport search assistant";
    pub const EVENT: &str = "events and activities assistant";
    pub const WEATHER: &str = "weather assistant";
    pub const QUESTION: &str = "travel planning assistant";
    pub const PLANNER: &str = "expert travel itinerary planner";
}

enum Behaviour {
    Respond(String),
    Fail,
    Hang(Duration),
}

/// Mock LLM client with configurable responses.
///
/// Routes are checked in insertion order; the first route whose fragment
/// occurs in the prompt decides the answer, otherwise the default applies.
///
/// ```ignore
/// // Same answer for every prompt
/// let client = MockLLMClient::new("OK");
///
/// // Every call fails
/// let client = MockLLMClient::failing();
///
/// // Per-agent answers
/// let client = MockLLMClient::new("{}")
///     .route(prompts::FLIGHT, r#"{"options": []}"#)
///     .fail_on(prompts::PLANNER);
/// ```
pub struct MockLLMClient {
    routes: Vec<(String, Behaviour)>,
    default: Behaviour,
    prompts: Mutex<Vec<String>>,
}

impl MockLLMClient {
    /// Create a mock client that returns `response` for every prompt.
    pub fn new(response: &str) -> Self {
        Self {
            routes: Vec::new(),
            default: Behaviour::Respond(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            routes: Vec::new(),
            default: Behaviour::Fail,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer prompts containing `fragment` with `response`.
    pub fn route(mut self, fragment: &str, response: &str) -> Self {
        self.routes
            .push((fragment.to_string(), Behaviour::Respond(response.to_string())));
        self
    }

    /// Fail prompts containing `fragment`.
    pub fn fail_on(mut self, fragment: &str) -> Self {
        self.routes.push((fragment.to_string(), Behaviour::Fail));
        self
    }

    /// Stall prompts containing `fragment` for `delay` before answering `{}`.
    pub fn hang_on(mut self, fragment: &str, delay: Duration) -> Self {
        self.routes.push((fragment.to_string(), Behaviour::Hang(delay)));
        self
    }

    /// Wrap in an `Arc` ready to hand to the coordinator.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of prompts containing `fragment`.
    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.prompts
            .lock()
            .iter()
            .filter(|p| p.contains(fragment))
            .count()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn prompt(&self, prompt: &str, _model: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());

        let behaviour = self
            .routes
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, b)| b)
            .unwrap_or(&self.default);

        match behaviour {
            Behaviour::Respond(body) => Ok(body.clone()),
            Behaviour::Fail => Err(AppError::LLM("Mock LLM failure".to_string())),
            Behaviour::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("{}".to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
