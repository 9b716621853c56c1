use super::{
    amendments_clause, ask, dates_for_prompt, into_document, parse_object, AgentSettings,
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
      "name": "string",
      "pricePerNight": "string",
      "totalPrice": "string",
      "location": "string",
      "rating": "string",
      "amenities": ["string"],
      "pros": ["string"],
      "cons": ["string"],
      "bookingUrl": "string"
    }
  ],
  "recommended": {"name": "string", "price": "string", "notes": "string"},
  "summary": "string"
}"#;

/// Searches accommodation for the trip.
pub struct HotelAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl HotelAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        format!(
            "You are a hotel search assistant. Trip: '{}' in {}, tentative dates {}, {} nights, \
             {} guests, budget '{}'. Find up to {} hotel options with different price ranges and \
             locations, and pick one as recommended. Special needs: {}. {}\n{}\n{}",
            request.trip_title,
            request.region,
            dates_for_prompt(request),
            request.days.max(1),
            request.people,
            request.budget,
            self.settings.max_options,
            request.special.describe(),
            amendments_clause(request, "hotels"),
            JSON_ONLY,
            SCHEMA,
        )
    }
}

#[async_trait]
impl DomainAgent for HotelAgent {
    type Output = Document;

    fn name(&self) -> &'static str {
        "hotel"
    }

    async fn search(&self, request: &TripRequest) -> Result<Document> {
        let body = ask(&self.llm, &self.settings, self.name(), &self.build_prompt(request)).await?;

        Ok(parse_object(&body).unwrap_or_else(|| {
            tracing::warn!(agent = self.name(), "Unparseable model answer, using fallback");
            fallback_hotels()
        }))
    }
}

/// Canonical hotel document used when the model answer is unusable.
pub fn fallback_hotels() -> Document {
    into_document(json!({
        "options": [
            {
                "name": "Luxury Resort",
                "pricePerNight": "250 USD",
                "totalPrice": "750 USD",
                "location": "City Center",
                "rating": "4.8/5",
                "amenities": ["Pool", "Spa", "Restaurant"],
                "pros": ["Great location", "Excellent amenities"],
                "cons": ["Higher price"],
                "bookingUrl": "https://example.com"
            },
            {
                "name": "Budget Inn",
                "pricePerNight": "80 USD",
                "totalPrice": "240 USD",
                "location": "Near Airport",
                "rating": "3.5/5",
                "amenities": ["Free WiFi", "Breakfast"],
                "pros": ["Affordable", "Clean rooms"],
                "cons": ["Further from city"],
                "bookingUrl": "https://example.com"
            }
        ],
        "summary": "Found multiple hotel options with different price ranges and locations."
    }))
}
