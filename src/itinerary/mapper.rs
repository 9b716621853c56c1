//! Conversion of loosely-typed agent output into the itinerary model.
//!
//! Every function here is total: malformed input degrades to empty or partial
//! output plus a list of issues, never to an error.

use crate::types::{
    Activity, Booking, DayPlan, Document, FlightBooking, HotelBooking, TransportBooking,
};
use serde_json::Value;

const NOTES_KEY: &str = "notes";
const NOTES_PARSED_KEY: &str = "notes_parsed";

/// A mapped value together with the problems met while producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapped<T> {
    pub value: T,
    pub issues: Vec<String>,
}

impl<T> Mapped<T> {
    fn new(value: T, issues: Vec<String>) -> Self {
        Self { value, issues }
    }
}

/// Build the booking section from the three booking-related agent results.
///
/// Raw documents are kept (after the notes pass). A typed sub-booking is
/// derived from `recommended`, or else from the first entry of the domain's
/// option lists.
pub fn map_to_booking(
    flights: &Document,
    transport: &Document,
    hotels: &Document,
) -> Mapped<Booking> {
    let mut issues = Vec::new();

    let flights = with_parsed_notes(flights, "flights", &mut issues);
    let transport = with_parsed_notes(transport, "transport", &mut issues);
    let hotels = with_parsed_notes(hotels, "hotels", &mut issues);

    let flights_typed = typed_candidate(&flights, &["options"], "flights", &mut issues).map(|rec| {
        FlightBooking {
            carrier: string_field(rec, &["carrier", "airline"]),
            price: string_field(rec, &["price", "totalPrice"]),
            notes: parsed_notes(rec),
        }
    });

    let transport_typed = typed_candidate(
        &transport,
        &["carRental", "trainOptions", "busOptions"],
        "transport",
        &mut issues,
    )
    .map(|rec| TransportBooking {
        provider: string_field(rec, &["provider"]),
        price: string_field(rec, &["price", "totalPrice", "pricePerDay"]),
        notes: parsed_notes(rec),
    });

    let hotels_typed = typed_candidate(&hotels, &["options"], "hotels", &mut issues).map(|rec| {
        HotelBooking {
            name: string_field(rec, &["name"]),
            price: string_field(rec, &["price", "totalPrice", "pricePerNight"]),
            notes: parsed_notes(rec),
        }
    });

    Mapped::new(
        Booking {
            flights,
            transport,
            hotels,
            flights_typed,
            transport_typed,
            hotels_typed,
        },
        issues,
    )
}

/// Copy the event list, running the notes pass over every event.
pub fn map_to_events(events: &[Document]) -> Mapped<Vec<Document>> {
    let mut issues = Vec::new();
    let value = events
        .iter()
        .enumerate()
        .map(|(i, event)| with_parsed_notes(event, &format!("events[{}]", i), &mut issues))
        .collect();
    Mapped::new(value, issues)
}

/// Copy the weather document, running the notes pass.
pub fn map_to_weather(weather: &Document) -> Mapped<Document> {
    let mut issues = Vec::new();
    let value = with_parsed_notes(weather, "weather", &mut issues);
    Mapped::new(value, issues)
}

/// Convert a `dayPlans` JSON array into typed day plans.
///
/// Non-arrays map to an empty list. Elements and activities that are not
/// objects are skipped.
pub fn map_to_day_plans(value: &Value) -> Vec<DayPlan> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|plan| DayPlan {
            day_number: day_number(plan.get("dayNumber")),
            title: string_field(plan, &["title"]).unwrap_or_default(),
            activities: plan
                .get("activities")
                .and_then(Value::as_array)
                .map(|acts| acts.iter().filter_map(Value::as_object).map(to_activity).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn to_activity(raw: &Document) -> Activity {
    let mut details = raw.clone();
    let title = details.remove("title");
    let time = details.remove("time");

    Activity {
        title: title.as_ref().and_then(scalar_text).unwrap_or_default(),
        time: time.as_ref().and_then(scalar_text).filter(|t| !t.is_empty()),
        details,
    }
}

fn day_number(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Copy `doc` and attach `notes_parsed` next to every JSON-looking `notes`.
fn with_parsed_notes(doc: &Document, path: &str, issues: &mut Vec<String>) -> Document {
    let mut copy = doc.clone();
    parse_notes_in_object(&mut copy, path, issues);
    copy
}

fn parse_notes_in_object(map: &mut Document, path: &str, issues: &mut Vec<String>) {
    let mut parsed = None;

    for (key, child) in map.iter_mut() {
        let child_path = format!("{}.{}", path, key);

        if key.eq_ignore_ascii_case(NOTES_KEY) {
            if let Value::String(text) = child {
                let trimmed = text.trim();
                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    match serde_json::from_str::<Value>(trimmed) {
                        Ok(_) if parsed.is_some() => {
                            tracing::warn!(path = %child_path, "Second JSON notes key in one object");
                            issues.push(format!(
                                "{}: ignored, another notes key already fills notes_parsed",
                                child_path
                            ));
                        }
                        Ok(value) => parsed = Some(value),
                        Err(e) => {
                            tracing::warn!(path = %child_path, error = %e, "Notes look like JSON but do not parse");
                            issues.push(format!("{}: invalid JSON in notes ({})", child_path, e));
                        }
                    }
                }
                continue;
            }
        }

        parse_notes_in_value(child, &child_path, issues);
    }

    if let Some(value) = parsed {
        map.insert(NOTES_PARSED_KEY.to_string(), value);
    }
}

fn parse_notes_in_value(value: &mut Value, path: &str, issues: &mut Vec<String>) {
    match value {
        Value::Object(map) => parse_notes_in_object(map, path, issues),
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                parse_notes_in_value(item, &format!("{}[{}]", path, i), issues);
            }
        }
        _ => {}
    }
}

/// Pick the sub-document a typed booking is built from.
fn typed_candidate<'a>(
    doc: &'a Document,
    option_keys: &[&str],
    component: &str,
    issues: &mut Vec<String>,
) -> Option<&'a Document> {
    let candidate = doc
        .get("recommended")
        .filter(|v| !v.is_null())
        .or_else(|| {
            option_keys
                .iter()
                .filter_map(|key| doc.get(*key).and_then(Value::as_array))
                .find_map(|items| items.first())
        })?;

    match candidate.as_object() {
        Some(obj) => Some(obj),
        None => {
            issues.push(format!(
                "{}: recommended option is not an object, typed booking skipped",
                component
            ));
            None
        }
    }
}

fn parsed_notes(rec: &Document) -> Option<Document> {
    rec.get(NOTES_PARSED_KEY)
        .and_then(Value::as_object)
        .cloned()
}

/// First scalar among `keys`, rendered as text.
fn string_field(doc: &Document, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| doc.get(*key).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::into_document;
    use serde_json::json;

    #[test]
    fn test_notes_pass_parses_nested_notes() {
        let doc = into_document(json!({
            "recommended": {"carrier": "DemoAir", "notes": "{\"seat\":\"aisle\"}"},
            "options": [
                {"carrier": "X", "Notes": " [1, 2] "},
                {"carrier": "Y", "notes": "plain text"}
            ]
        }));
        let mapped = map_to_booking(&doc, &Document::new(), &Document::new());
        let flights = &mapped.value.flights;

        assert_eq!(flights["recommended"]["notes_parsed"], json!({"seat": "aisle"}));
        assert_eq!(flights["recommended"]["notes"], "{\"seat\":\"aisle\"}");
        assert_eq!(flights["options"][0]["notes_parsed"], json!([1, 2]));
        assert!(flights["options"][1].get("notes_parsed").is_none());
        assert!(mapped.issues.is_empty());

        let typed = mapped.value.flights_typed.unwrap();
        assert_eq!(typed.carrier.as_deref(), Some("DemoAir"));
        assert_eq!(typed.notes, Some(into_document(json!({"seat": "aisle"}))));
    }

    #[test]
    fn test_broken_json_notes_are_reported() {
        let weather = into_document(json!({"dailyForecast": [{"notes": "{not json"}]}));
        let mapped = map_to_weather(&weather);

        assert_eq!(mapped.value, weather);
        assert_eq!(mapped.issues.len(), 1);
        assert!(mapped.issues[0].starts_with("weather.dailyForecast[0].notes"));
    }

    #[test]
    fn test_competing_notes_keys_are_reported() {
        let weather = into_document(json!({
            "forecastSummary": "Dry",
            "notes": "{\"source\": \"model\"}",
            "Notes": "{\"source\": \"fallback\"}"
        }));
        let mapped = map_to_weather(&weather);

        let parsed = &mapped.value["notes_parsed"];
        assert!(
            *parsed == json!({"source": "model"}) || *parsed == json!({"source": "fallback"})
        );
        assert_eq!(mapped.issues.len(), 1);
        assert!(mapped.issues[0].contains("another notes key already fills notes_parsed"));
    }

    #[test]
    fn test_typed_booking_falls_back_to_first_option() {
        let hotels = into_document(json!({
            "options": [{"name": "Harbour Inn", "pricePerNight": "90 USD"}]
        }));
        let transport = into_document(json!({
            "carRental": [],
            "trainOptions": [{"provider": "Rail Express", "price": 25}]
        }));
        let booking = map_to_booking(&Document::new(), &transport, &hotels).value;

        let hotel = booking.hotels_typed.unwrap();
        assert_eq!(hotel.name.as_deref(), Some("Harbour Inn"));
        assert_eq!(hotel.price.as_deref(), Some("90 USD"));

        let train = booking.transport_typed.unwrap();
        assert_eq!(train.provider.as_deref(), Some("Rail Express"));
        assert_eq!(train.price.as_deref(), Some("25"));

        assert!(booking.flights_typed.is_none());
    }

    #[test]
    fn test_non_object_recommendation_is_annotated() {
        let flights = into_document(json!({"recommended": "the cheap one"}));
        let mapped = map_to_booking(&flights, &Document::new(), &Document::new());

        assert!(mapped.value.flights_typed.is_none());
        assert_eq!(mapped.value.flights["recommended"], "the cheap one");
        assert_eq!(mapped.issues.len(), 1);
        assert!(mapped.issues[0].starts_with("flights:"));
    }

    #[test]
    fn test_events_keep_order_and_get_notes_pass() {
        let events = vec![
            into_document(json!({"name": "A", "NOTES": "{\"dress\":\"formal\"}"})),
            into_document(json!({"name": "B"})),
        ];
        let mapped = map_to_events(&events);
        assert_eq!(mapped.value[0]["notes_parsed"]["dress"], "formal");
        assert_eq!(mapped.value[1]["name"], "B");
    }

    #[test]
    fn test_day_plans_from_non_array_is_empty() {
        assert!(map_to_day_plans(&json!({"dayPlans": []})).is_empty());
        assert!(map_to_day_plans(&json!("three days")).is_empty());
        assert!(map_to_day_plans(&Value::Null).is_empty());
    }

    #[test]
    fn test_day_plans_tolerate_loose_shapes() {
        let plans = map_to_day_plans(&json!([
            {"dayNumber": "2", "title": "Museums", "activities": [
                {"title": "Louvre", "time": "10:00", "cost": "22 EUR"},
                "lunch somewhere",
                {"title": "Orsay"}
            ]},
            42,
            {"dayNumber": "third", "activities": "none"}
        ]));

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].day_number, 2);
        assert_eq!(plans[0].activities.len(), 2);
        assert_eq!(plans[0].activities[0].details["cost"], "22 EUR");
        assert!(plans[0].activities[0].details.get("title").is_none());
        assert_eq!(plans[0].activities[1].time, None);
        assert_eq!(plans[1].day_number, 0);
        assert!(plans[1].title.is_empty());
        assert!(plans[1].activities.is_empty());
    }
}
