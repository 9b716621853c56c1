use super::{
    amendments_clause, ask, dates_for_prompt, into_document, list_or, parse_object,
    AgentSettings, DomainAgent, JSON_ONLY,
};
use crate::llm::LLMClient;
use crate::types::{Document, Result, TripRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const SCHEMA: &str = r#"{
  "carRental": [
    {"provider": "string", "pricePerDay": "string", "totalPrice": "string", "carType": "string",
     "pros": ["string"], "cons": ["string"], "bookingUrl": "string"}
  ],
  "trainOptions": [
    {"provider": "string", "price": "string", "duration": "string", "route": "string",
     "pros": ["string"], "cons": ["string"], "bookingUrl": "string"}
  ],
  "busOptions": [
    {"provider": "string", "price": "string", "duration": "string", "route": "string",
     "pros": ["string"], "cons": ["string"], "bookingUrl": "string"}
  ],
  "recommended": {"provider": "string", "price": "string", "notes": "string"},
  "summary": "string"
}"#;

/// Searches ground transport (car rental, trains, buses).
pub struct TransportAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl TransportAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        format!(
            "You are a transport search assistant. Trip to {}, tentative dates {}, {} travellers, \
             booking preferences: {}. Find up to {} options across car rental, trains and buses. \
             Special needs: {}. {}\n{}\n{}",
            request.region,
            dates_for_prompt(request),
            request.people,
            list_or(&request.booking_preferences, "none"),
            self.settings.max_options,
            request.special.describe(),
            amendments_clause(request, "transport"),
            JSON_ONLY,
            SCHEMA,
        )
    }
}

#[async_trait]
impl DomainAgent for TransportAgent {
    type Output = Document;

    fn name(&self) -> &'static str {
        "transport"
    }

    async fn search(&self, request: &TripRequest) -> Result<Document> {
        let body = ask(&self.llm, &self.settings, self.name(), &self.build_prompt(request)).await?;

        Ok(parse_object(&body).unwrap_or_else(|| {
            tracing::warn!(agent = self.name(), "Unparseable model answer, using fallback");
            fallback_transport()
        }))
    }
}

/// Canonical transport document used when the model answer is unusable.
pub fn fallback_transport() -> Document {
    into_document(json!({
        "carRental": [
            {
                "provider": "RentACar Pro",
                "pricePerDay": "45 USD",
                "totalPrice": "135 USD",
                "carType": "Compact",
                "pros": ["Flexible", "Door-to-door"],
                "cons": ["Parking costs"],
                "bookingUrl": "https://example.com"
            }
        ],
        "trainOptions": [
            {
                "provider": "Rail Express",
                "price": "25 USD",
                "duration": "2h 15m",
                "route": "City to City",
                "pros": ["Scenic route", "Comfortable"],
                "cons": ["Fixed schedule"],
                "bookingUrl": "https://example.com"
            }
        ],
        "busOptions": [
            {
                "provider": "Budget Bus",
                "price": "15 USD",
                "duration": "3h 30m",
                "route": "City to City",
                "pros": ["Cheapest option"],
                "cons": ["Longer journey"],
                "bookingUrl": "https://example.com"
            }
        ],
        "summary": "Found multiple transport options with different price points and convenience levels."
    }))
}
