use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Loosely-typed JSON object returned by a domain agent.
///
/// Model output is never trusted to be well-formed, so agents and the mapper
/// pass results around as plain JSON objects and only extract typed fields on
/// a best-effort basis.
pub type Document = Map<String, Value>;

// ============= Trip Request =============

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    #[serde(default)]
    pub trip_title: String,
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub people: u32,
    #[serde(default)]
    pub special: SpecialNeeds,
    #[serde(default = "default_weather_preference")]
    pub weather_preference: String,
    #[serde(default)]
    pub food_preferences: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub booking_preferences: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub amendments: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tentative_dates: Option<TentativeDates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_itinerary: Option<Itinerary>,
}

fn default_weather_preference() -> String {
    "any".to_string()
}

impl TripRequest {
    /// Refinement requires both amendment text and an itinerary to amend.
    pub fn is_refinement(&self) -> bool {
        !self.amendments.trim().is_empty() && self.previous_itinerary.is_some()
    }

    /// Human-readable form of the tentative dates, empty when absent.
    pub fn dates_display(&self) -> String {
        match &self.tentative_dates {
            Some(TentativeDates::Range(text)) => text.clone(),
            Some(TentativeDates::List(dates)) => dates.join(", "),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialNeeds {
    #[serde(default)]
    pub kids: bool,
    #[serde(default)]
    pub elderly: bool,
    #[serde(default)]
    pub differently_abled: bool,
}

impl SpecialNeeds {
    /// Short description used in prompts, e.g. `kids, elderly`.
    pub fn describe(&self) -> String {
        let mut needs = Vec::new();
        if self.kids {
            needs.push("kids");
        }
        if self.elderly {
            needs.push("elderly");
        }
        if self.differently_abled {
            needs.push("differently abled");
        }
        if needs.is_empty() {
            "none".to_string()
        } else {
            needs.join(", ")
        }
    }
}

/// Either a free-text range (`2025-12-20 to 2025-12-27`) or a list of dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TentativeDates {
    Range(String),
    List(Vec<String>),
}

// ============= Itinerary =============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub day_plans: Vec<DayPlan>,
    #[serde(default)]
    pub bookings: Booking,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<Map<String, Value>>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub weather: Map<String, Value>,
    #[serde(default)]
    pub notes_parsing_errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    #[serde(default)]
    pub day_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// One scheduled item. Anything beyond title and time stays in `details`
/// and is serialized inline next to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub flights: Map<String, Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub transport: Map<String, Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub hotels: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flights_typed: Option<FlightBooking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_typed: Option<TransportBooking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotels_typed: Option<HotelBooking>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlightBooking {
    pub carrier: Option<String>,
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub notes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransportBooking {
    pub provider: Option<String>,
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub notes: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HotelBooking {
    pub name: Option<String>,
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub notes: Option<Map<String, Value>>,
}

// ============= Clarifying Questions =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Destination,
    Activity,
    Pace,
    Budget,
    Preference,
}

impl QuestionType {
    /// Parse a model-supplied tag; unknown tags become `Preference`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "destination" => QuestionType::Destination,
            "activity" => QuestionType::Activity,
            "pace" => QuestionType::Pace,
            "budget" => QuestionType::Budget,
            _ => QuestionType::Preference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClarifyingQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub questions: Vec<ClarifyingQuestion>,
    pub context: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::LLM(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Timeout(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_request_accepts_camel_case_and_defaults() {
        let req: TripRequest = serde_json::from_value(json!({
            "tripTitle": "Alps",
            "days": 3,
            "people": 2,
            "special": {"kids": true, "differentlyAbled": true}
        }))
        .unwrap();

        assert_eq!(req.trip_title, "Alps");
        assert_eq!(req.weather_preference, "any");
        assert!(req.special.kids);
        assert!(!req.special.elderly);
        assert_eq!(req.special.describe(), "kids, differently abled");
        assert!(req.tentative_dates.is_none());
    }

    #[test]
    fn test_tentative_dates_string_or_list() {
        let range: TripRequest =
            serde_json::from_value(json!({"tentativeDates": "2025-12-20 to 2025-12-27"})).unwrap();
        assert_eq!(
            range.tentative_dates,
            Some(TentativeDates::Range("2025-12-20 to 2025-12-27".into()))
        );

        let list: TripRequest =
            serde_json::from_value(json!({"tentativeDates": ["2025-12-20", "2025-12-27"]}))
                .unwrap();
        assert_eq!(list.dates_display(), "2025-12-20, 2025-12-27");
    }

    #[test]
    fn test_refinement_needs_amendments_and_previous() {
        let mut req = TripRequest {
            amendments: "   ".into(),
            previous_itinerary: Some(Itinerary::default()),
            ..Default::default()
        };
        assert!(!req.is_refinement());

        req.amendments = "slower day 2".into();
        assert!(req.is_refinement());

        req.previous_itinerary = None;
        assert!(!req.is_refinement());
    }

    #[test]
    fn test_activity_details_are_flattened() {
        let activity: Activity = serde_json::from_value(json!({
            "title": "Louvre",
            "time": "10:00",
            "location": "Paris",
            "cost": "22 EUR"
        }))
        .unwrap();
        assert_eq!(activity.details.get("location"), Some(&json!("Paris")));

        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["title"], "Louvre");
        assert_eq!(value["cost"], "22 EUR");
    }

    #[test]
    fn test_itinerary_wire_names() {
        let itinerary = Itinerary {
            summary: "s".into(),
            notes_parsing_errors: vec!["e".into()],
            ..Default::default()
        };
        let value = serde_json::to_value(&itinerary).unwrap();
        assert!(value.get("dayPlans").is_some());
        assert!(value.get("notesParsingErrors").is_some());
        assert!(value["bookings"].get("flightsTyped").is_none());
    }

    #[test]
    fn test_question_type_from_tag() {
        assert_eq!(QuestionType::from_tag("Pace"), QuestionType::Pace);
        assert_eq!(QuestionType::from_tag("weird"), QuestionType::Preference);
    }
}
