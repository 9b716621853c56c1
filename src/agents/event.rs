use super::{
    amendments_clause, ask, dates_for_prompt, into_document, list_or, parse_json_payload,
    AgentSettings, DomainAgent, JSON_ONLY,
};
use crate::llm::LLMClient;
use crate::types::{Document, Result, TripRequest};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA: &str = r#"{
  "events": [
    {
      "name": "string",
      "date": "YYYY-MM-DD",
      "time": "HH:MM",
      "location": "string",
      "description": "string",
      "category": "string",
      "price": "string",
      "duration": "string",
      "bookingUrl": "string"
    }
  ]
}"#;

/// Finds events, attractions and experiences matching the traveller's interests.
pub struct EventAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl EventAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        format!(
            "You are an events and activities assistant. Region: {}, tentative dates {}, \
             interests: {}, food preferences: {}. Find up to {} relevant events, activities, \
             attractions or experiences suitable for this trip. Special needs: {}. {}\n{}\n{}",
            request.region,
            dates_for_prompt(request),
            list_or(&request.interests, "general sightseeing"),
            list_or(&request.food_preferences, "none"),
            self.settings.max_options,
            request.special.describe(),
            amendments_clause(request, "events"),
            JSON_ONLY,
            SCHEMA,
        )
    }
}

/// Pull the event list out of a parsed answer.
///
/// Accepts `{"events": [...]}` or a bare array. Non-object entries are dropped.
fn extract_events(value: Value) -> Option<Vec<Document>> {
    let items = match value {
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        Value::Array(items) => items,
        _ => return None,
    };

    Some(
        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
    )
}

#[async_trait]
impl DomainAgent for EventAgent {
    type Output = Vec<Document>;

    fn name(&self) -> &'static str {
        "event"
    }

    async fn search(&self, request: &TripRequest) -> Result<Vec<Document>> {
        let body = ask(&self.llm, &self.settings, self.name(), &self.build_prompt(request)).await?;

        Ok(parse_json_payload(&body)
            .and_then(extract_events)
            .unwrap_or_else(|| {
                tracing::warn!(agent = self.name(), "Unparseable model answer, using fallback");
                fallback_events()
            }))
    }
}

/// Canonical event list used when the model answer is unusable.
pub fn fallback_events() -> Vec<Document> {
    vec![
        into_document(json!({
            "name": "City Museum Tour",
            "date": "2025-01-15",
            "time": "10:00",
            "location": "City Center",
            "description": "Guided tour of local history",
            "category": "Culture",
            "price": "15 USD",
            "duration": "2h",
            "bookingUrl": "https://example.com"
        })),
        into_document(json!({
            "name": "Food Market Visit",
            "date": "2025-01-16",
            "time": "14:00",
            "location": "Old Town",
            "description": "Local food tasting experience",
            "category": "Food",
            "price": "25 USD",
            "duration": "3h",
            "bookingUrl": "https://example.com"
        })),
        into_document(json!({
            "name": "Scenic Walking Tour",
            "date": "2025-01-17",
            "time": "09:00",
            "location": "Historic District",
            "description": "Explore historic landmarks",
            "category": "Sightseeing",
            "price": "Free",
            "duration": "2h",
            "bookingUrl": "https://example.com"
        })),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::CannedLLM;

    async fn search_with(body: &str) -> Vec<Document> {
        let agent = EventAgent::new(Arc::new(CannedLLM::new(body)), AgentSettings::default());
        agent.search(&TripRequest::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_events_key_is_extracted() {
        let events =
            search_with(r#"{"events": [{"name": "Jazz night"}, "stray", {"name": "Opera"}]}"#)
                .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1]["name"], "Opera");
    }

    #[tokio::test]
    async fn test_bare_array_is_accepted() {
        let events = search_with(r#"[{"name": "Harbour cruise"}]"#).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_events_key_uses_fallback() {
        let events = search_with(r#"{"activities": []}"#).await;
        assert_eq!(events, fallback_events());
    }

    #[tokio::test]
    async fn test_non_json_uses_fallback() {
        let events = search_with("no events today").await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[2]["price"], "Free");
    }
}
