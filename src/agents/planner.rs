use super::{ask, into_document, list_or, parse_json_payload, AgentSettings, JSON_ONLY};
use crate::itinerary::mapper::map_to_day_plans;
use crate::llm::LLMClient;
use crate::types::{Activity, DayPlan, Document, Result, TripRequest};
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEMA: &str = r#"{
  "dayPlans": [
    {
      "dayNumber": 1,
      "title": "string",
      "activities": [
        {
          "title": "string",
          "time": "HH:MM",
          "duration": "string",
          "location": "string",
          "description": "string",
          "category": "string",
          "cost": "string",
          "bookingUrl": "string"
        }
      ]
    }
  ],
  "summary": "string"
}"#;

/// Turns the combined agent evidence into a day-by-day schedule.
pub struct PlannerAgent {
    llm: Arc<dyn LLMClient>,
    settings: AgentSettings,
}

impl PlannerAgent {
    pub fn new(llm: Arc<dyn LLMClient>, settings: AgentSettings) -> Self {
        Self { llm, settings }
    }

    fn build_create_prompt(
        &self,
        request: &TripRequest,
        flights: &Document,
        hotels: &Document,
        transport: &Document,
        events: &[Document],
        weather: &Document,
    ) -> String {
        format!(
            "You are an expert travel itinerary planner. Create a detailed day-by-day itinerary.\n\n\
             Trip Details:\n\
             - Title: {title}\n\
             - Duration: {days} days\n\
             - Region: {region}\n\
             - People: {people}\n\
             - Interests: {interests}\n\
             - Special Needs: {special}\n\
             - Weather Preference: {weather_pref}\n\
             - Notes: {notes}\n\n\
             Available Resources:\n\
             - Flights: {flights}\n\
             - Hotels: {hotels}\n\
             - Transport: {transport}\n\
             - Events/Activities: {events}\n\
             - Weather: {weather}\n\n\
             Create a realistic itinerary that:\n\
             1. Contains exactly {days} day plans with appropriate pacing\n\
             2. Considers travel time between locations\n\
             3. Balances sightseeing, dining and relaxation\n\
             4. Accounts for special needs and interests\n\
             5. Includes practical details like check-in and check-out times\n\
             6. Considers weather conditions for outdoor activities\n\
             7. Provides realistic timing and durations\n\n\
             {json_only}\n{schema}",
            title = request.trip_title,
            days = request.days,
            region = request.region,
            people = request.people,
            interests = list_or(&request.interests, "General"),
            special = request.special.describe(),
            weather_pref = request.weather_preference,
            notes = if request.notes.trim().is_empty() {
                "None"
            } else {
                request.notes.as_str()
            },
            flights = compact(flights),
            hotels = compact(hotels),
            transport = compact(transport),
            events = serde_json::to_string(events).unwrap_or_default(),
            weather = compact(weather),
            json_only = JSON_ONLY,
            schema = SCHEMA,
        )
    }

    fn build_refine_prompt(
        &self,
        request: &TripRequest,
        previous: &[DayPlan],
        amendments: &str,
    ) -> String {
        format!(
            "You are an expert travel itinerary planner. Refine the following itinerary based on \
             the traveller's feedback.\n\n\
             Previous Itinerary:\n{previous}\n\n\
             Amendments:\n{amendments}\n\n\
             Trip Details:\n\
             - Title: {title}\n\
             - Duration: {days} days\n\
             - Region: {region}\n\
             - People: {people}\n\
             - Interests: {interests}\n\n\
             Adjust the itinerary according to the feedback while keeping a realistic, well-paced \
             schedule.\n{json_only}\n{schema}",
            previous = summarize_day_plans(previous),
            amendments = if amendments.trim().is_empty() {
                "No specific feedback"
            } else {
                amendments
            },
            title = request.trip_title,
            days = request.days,
            region = request.region,
            people = request.people,
            interests = list_or(&request.interests, "General"),
            json_only = JSON_ONLY,
            schema = SCHEMA,
        )
    }

    /// Plan the trip from scratch using every domain result.
    ///
    /// An unusable answer yields [`mock_day_plans`] for `request.days`.
    pub async fn create_day_plans(
        &self,
        request: &TripRequest,
        flights: &Document,
        hotels: &Document,
        transport: &Document,
        events: &[Document],
        weather: &Document,
    ) -> Result<Vec<DayPlan>> {
        let prompt =
            self.build_create_prompt(request, flights, hotels, transport, events, weather);
        let body = ask(&self.llm, &self.settings, "planner", &prompt).await?;

        Ok(parse_day_plans(&body).unwrap_or_else(|| {
            tracing::warn!(agent = "planner", days = request.days, "Unusable plan, using mock schedule");
            mock_day_plans(request.days)
        }))
    }

    /// Rework `previous` according to the amendment text.
    ///
    /// An unusable answer returns `previous` unchanged.
    pub async fn refine_day_plans(
        &self,
        request: &TripRequest,
        previous: &[DayPlan],
        amendments: &str,
    ) -> Result<Vec<DayPlan>> {
        let prompt = self.build_refine_prompt(request, previous, amendments);
        let body = ask(&self.llm, &self.settings, "planner", &prompt).await?;

        Ok(parse_day_plans(&body).unwrap_or_else(|| {
            tracing::warn!(agent = "planner", "Unusable refinement, keeping previous plan");
            previous.to_vec()
        }))
    }
}

fn compact(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_default()
}

/// `Day N: title` entries joined by `; `.
pub fn summarize_day_plans(plans: &[DayPlan]) -> String {
    if plans.is_empty() {
        return "No previous itinerary".to_string();
    }
    plans
        .iter()
        .map(|p| format!("Day {}: {}", p.day_number, p.title))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extract day plans from a model answer; `None` when there are none to use.
fn parse_day_plans(body: &str) -> Option<Vec<DayPlan>> {
    let plans = match parse_json_payload(body)? {
        Value::Object(mut map) => map.remove("dayPlans")?,
        value @ Value::Array(_) => value,
        _ => return None,
    };
    if !plans.is_array() {
        return None;
    }

    let plans = map_to_day_plans(&plans);
    if plans.is_empty() {
        None
    } else {
        Some(plans)
    }
}

/// Deterministic placeholder schedule: two activities on each of `days` days.
pub fn mock_day_plans(days: u32) -> Vec<DayPlan> {
    (1..=days)
        .map(|i| DayPlan {
            day_number: i,
            title: format!("Day {} Activities", i),
            activities: vec![
                mock_activity(
                    format!("Morning Activity {}", i),
                    "09:00",
                    json!({
                        "duration": "2h",
                        "location": "City Center",
                        "description": "Explore local attractions",
                        "category": "Sightseeing",
                        "cost": "Free",
                        "bookingUrl": "https://example.com"
                    }),
                ),
                mock_activity(
                    format!("Afternoon Activity {}", i),
                    "14:00",
                    json!({
                        "duration": "3h",
                        "location": "Historic District",
                        "description": "Cultural experience",
                        "category": "Culture",
                        "cost": "25 USD",
                        "bookingUrl": "https://example.com"
                    }),
                ),
            ],
        })
        .collect()
}

fn mock_activity(title: String, time: &str, details: Value) -> Activity {
    Activity {
        title,
        time: Some(time.to_string()),
        details: into_document(details),
    }
}
