use super::{
    amendments_clause, ask, dates_for_prompt, into_document, list_or, parse_object, AgentSettings,
    DomainAgent, JSON_ONLY,
};
use crate::llm::LLMClient;
use crate::types::{Document, Result, TripRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &str = r#"{
  "options": [
    {
      "carrier": "string",
      "price": "string",
      "departureTime": "string",
      "arrivalTime": "string",
      "duration": "string",
      "stops": 0,
      "pros": ["string"],
      "cons": ["string"],
      "bookingUrl": "string"
    }
  ],
  "recommended": {"carrier": "string", "price": "string", "notes": "string"},
  "summary": "string"
}"#;

/// Searches flight options for the trip.
pub struct FlightAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl FlightAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        format!(
            "You are a flight search assistant. Trip: '{}', {} days to {}, {} travellers, budget '{}'. \
             Tentative dates: {}. Booking preferences: {}. \
             Find up to {} flight options with different price points and convenience levels, \
             and pick one as recommended. {}\n{}\n{}",
            request.trip_title,
            request.days,
            request.region,
            request.people,
            request.budget,
            dates_for_prompt(request),
            list_or(&request.booking_preferences, "none"),
            self.settings.max_options,
            amendments_clause(request, "flights"),
            JSON_ONLY,
            SCHEMA,
        )
    }
}

#[async_trait]
impl DomainAgent for FlightAgent {
    type Output = Document;

    fn name(&self) -> &'static str {
        "flight"
    }

    async fn search(&self, request: &TripRequest) -> Result<Document> {
        let body = ask(&self.llm, &self.settings, self.name(), &self.build_prompt(request)).await?;

        Ok(parse_object(&body).unwrap_or_else(|| {
            tracing::warn!(agent = self.name(), "Unparseable model answer, using fallback");
            fallback_flights()
        }))
    }
}

/// Canonical flight document used when the model answer is unusable.
pub fn fallback_flights() -> Document {
    into_document(json!({
        "recommended": {
            "carrier": "OpenAI Airlines",
            "price": "450 USD",
            "notes": "Fallback flight info"
        },
        "alternatives": [
            {"carrier": "Budget Air", "price": "320 USD", "notes": "Budget option"}
        ],
        "summary": "Found multiple flight options with different price points and schedules."
    }))
}
