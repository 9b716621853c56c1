#![allow(dead_code)]

pub mod mocks;

use itinera::TripRequest;

/// A request that passes validation.
pub fn trip_request(title: &str, days: u32) -> TripRequest {
    TripRequest {
        trip_title: title.to_string(),
        days,
        people: 2,
        region: "Testland".to_string(),
        budget: "1500 USD".to_string(),
        weather_preference: "any".to_string(),
        interests: vec!["food".to_string(), "museums".to_string()],
        ..Default::default()
    }
}
