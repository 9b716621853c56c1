//! Model-backed travel agents
//!
//! Each agent owns one slice of the trip: it builds a prompt from the
//! [`TripRequest`], asks the model for JSON in a fixed schema and turns the
//! answer into a [`Document`]. Agents never fail on a bad answer; a body that
//! does not parse, or parses into the wrong shape, is replaced by the agent's
//! canonical fallback document. Only transport failures (provider errors,
//! timeouts) are returned as `Err`.
//!
//! # Agents
//!
//! | Agent | Output | Fallback |
//! |-------|--------|----------|
//! | [`FlightAgent`] | object | [`flight::fallback_flights`] |
//! | [`HotelAgent`] | object | [`hotel::fallback_hotels`] |
//! | [`TransportAgent`] | object | [`transport::fallback_transport`] |
//! | [`EventAgent`] | list of objects | [`event::fallback_events`] |
//! | [`WeatherAgent`] | object | [`weather::fallback_weather`] |
//! | [`QuestionAgent`] | [`QuestionResponse`](crate::types::QuestionResponse) | [`question::default_questions`] |
//! | [`PlannerAgent`] | day plans | [`planner::mock_day_plans`] / previous plans |

pub mod event;
pub mod flight;
pub mod hotel;
pub mod planner;
pub mod question;
pub mod transport;
pub mod weather;

use crate::llm::LLMClient;
use crate::types::{AppError, Document, Result, TripRequest};
use crate::utils::toml_config::{AgentConfig, ItineraConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub use event::EventAgent;
pub use flight::FlightAgent;
pub use hotel::HotelAgent;
pub use planner::PlannerAgent;
pub use question::QuestionAgent;
pub use transport::TransportAgent;
pub use weather::WeatherAgent;

/// Trailer appended to every prompt that expects a JSON answer.
pub(crate) const JSON_ONLY: &str =
    "Return ONLY valid JSON strictly matching this schema. Do not add any commentary outside the JSON.";

/// Common contract of the five domain search agents
#[async_trait]
pub trait DomainAgent: Send + Sync {
    /// Result type produced by a search
    type Output: Send + 'static;

    /// Short agent name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Query the model for this agent's slice of the trip
    async fn search(&self, request: &TripRequest) -> Result<Self::Output>;
}

/// Resolved per-agent settings
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Model identifier sent with every prompt
    pub model: String,
    /// Deadline for a single model call
    pub timeout: Duration,
    /// Upper bound on options (or questions) requested from the model
    pub max_options: u32,
}

impl AgentSettings {
    /// Resolve an agent section against the provider defaults
    pub fn resolve(config: &ItineraConfig, agent: &AgentConfig) -> Self {
        Self {
            model: config.model_for(agent).to_string(),
            timeout: agent.timeout(),
            max_options: agent.max_options,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            timeout: Duration::from_secs(30),
            max_options: 5,
        }
    }
}

/// Send `prompt` under the agent's deadline.
pub(crate) async fn ask(
    llm: &Arc<dyn LLMClient>,
    settings: &AgentSettings,
    agent: &str,
    prompt: &str,
) -> Result<String> {
    tracing::debug!(agent, prompt_chars = prompt.len(), model = %settings.model, "Prompting model");

    tokio::time::timeout(settings.timeout, llm.prompt(prompt, &settings.model))
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "{} agent did not answer within {}s",
                agent,
                settings.timeout.as_secs()
            ))
        })?
}

/// Extract a JSON value from a model answer.
///
/// Accepts a bare JSON body, a body wrapped in a Markdown code fence, or JSON
/// surrounded by prose (from the first `{`/`[` to the last `}`/`]`).
pub fn parse_json_payload(body: &str) -> Option<Value> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if unfenced != trimmed {
        if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
            return Some(value);
        }
    }

    let start = unfenced.find(['{', '['])?;
    let close = if unfenced[start..].starts_with('{') {
        '}'
    } else {
        ']'
    };
    let end = unfenced.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&unfenced[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the opening line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model answer that must be a non-empty JSON object.
pub fn parse_object(body: &str) -> Option<Document> {
    match parse_json_payload(body)? {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Unwrap a `json!` literal into a document.
pub(crate) fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Tentative dates as prompt text
pub(crate) fn dates_for_prompt(request: &TripRequest) -> String {
    let dates = request.dates_display();
    if dates.is_empty() {
        "flexible".to_string()
    } else {
        dates
    }
}

/// Amendment clause shared by every domain prompt
pub(crate) fn amendments_clause(request: &TripRequest, subject: &str) -> String {
    let amendments = request.amendments.trim();
    if amendments.is_empty() {
        String::new()
    } else {
        format!(
            "The traveller asked for these changes: '{}'. Take them into account when suggesting {}. ",
            amendments, subject
        )
    }
}

/// Comma-separated list, or `fallback` when empty
pub(crate) fn list_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::llm::LLMClient;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Returns the same body for every prompt and remembers the prompts.
    pub struct CannedLLM {
        body: String,
        pub prompts: Mutex<Vec<String>>,
    }

    impl CannedLLM {
        pub fn new(body: impl Into<String>) -> Self {
            Self {
                body: body.into(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMClient for CannedLLM {
        async fn prompt(&self, prompt: &str, _model: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.body.clone())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    /// Fails every call like an unreachable provider.
    pub struct BrokenLLM;

    #[async_trait]
    impl LLMClient for BrokenLLM {
        async fn prompt(&self, _prompt: &str, _model: &str) -> Result<String> {
            Err(AppError::LLM("connection refused".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }
}
