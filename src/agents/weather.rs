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
  "forecastSummary": "string",
  "dailyForecast": [
    {
      "date": "YYYY-MM-DD",
      "high": "string",
      "low": "string",
      "condition": "string",
      "precipitation": "string",
      "wind": "string",
      "recommendations": ["string"]
    }
  ],
  "packingSuggestions": ["string"],
  "activityRecommendations": ["string"]
}"#;

/// Forecasts weather and derives packing and activity advice.
pub struct WeatherAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl WeatherAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_prompt(&self, request: &TripRequest) -> String {
        format!(
            "You are a weather assistant. Region: {}, tentative dates {}, {} days, weather \
             preference '{}'. Provide a forecast for the trip duration, then suggest packing items \
             and activities that suit the expected weather and the preference. {}\n{}\n{}",
            request.region,
            dates_for_prompt(request),
            request.days,
            request.weather_preference,
            amendments_clause(request, "activities"),
            JSON_ONLY,
            SCHEMA,
        )
    }
}

#[async_trait]
impl DomainAgent for WeatherAgent {
    type Output = Document;

    fn name(&self) -> &'static str {
        "weather"
    }

    async fn search(&self, request: &TripRequest) -> Result<Document> {
        let body = ask(&self.llm, &self.settings, self.name(), &self.build_prompt(request)).await?;

        Ok(parse_object(&body).unwrap_or_else(|| {
            tracing::warn!(agent = self.name(), "Unparseable model answer, using fallback");
            fallback_weather()
        }))
    }
}

/// Canonical weather document used when the model answer is unusable.
pub fn fallback_weather() -> Document {
    into_document(json!({
        "forecastSummary": "Generally pleasant weather with mild temperatures",
        "dailyForecast": [
            {
                "date": "2025-01-15",
                "high": "22°C",
                "low": "12°C",
                "condition": "Partly cloudy",
                "precipitation": "10%",
                "wind": "Light breeze",
                "recommendations": ["Perfect for outdoor activities", "Light jacket recommended"]
            },
            {
                "date": "2025-01-16",
                "high": "25°C",
                "low": "15°C",
                "condition": "Sunny",
                "precipitation": "0%",
                "wind": "Calm",
                "recommendations": ["Great day for sightseeing", "Sunscreen recommended"]
            },
            {
                "date": "2025-01-17",
                "high": "20°C",
                "low": "10°C",
                "condition": "Overcast",
                "precipitation": "30%",
                "wind": "Moderate",
                "recommendations": ["Indoor activities preferred", "Umbrella suggested"]
            }
        ],
        "packingSuggestions": ["Light jacket", "Comfortable walking shoes", "Sunscreen", "Umbrella"],
        "activityRecommendations": ["Outdoor sightseeing", "Museum visits", "Food tours"]
    }))
}
