//! Trip request validation
//!
//! Runs before any request reaches the agents. Free-text fields are
//! sanitized in place and screened for prompt injection; numeric ranges and
//! enumerated fields are checked. Problems that make a request unusable are
//! errors (the API answers 400); everything else is a warning and the request
//! proceeds with the corrected values.

use crate::types::{TentativeDates, TripRequest};
use chrono::NaiveDate;
use itinera_guard::{InputSanitizer, PromptInjectionDetector, ThreatLevel};
use regex::Regex;

const MAX_DAYS: u32 = 365;
const MAX_PEOPLE: u32 = 50;
const MAX_INTERESTS: usize = 10;
const RECOMMENDED_INTERESTS: usize = 5;
const MAX_INTEREST_LEN: usize = 50;
const MAX_FOOD_PREFERENCES: usize = 10;
const MAX_FOOD_PREFERENCE_LEN: usize = 100;

const BOOKING_PREFERENCES: [&str; 4] = ["flight", "train", "car", "bus"];
const WEATHER_PREFERENCES: [&str; 6] = ["any", "warm", "mild", "cool", "cold", "rainy"];

/// Outcome of validating one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Sanitizes and checks incoming [`TripRequest`]s.
pub struct TripRequestValidator {
    sanitizer: InputSanitizer,
    detector: PromptInjectionDetector,
    budget_pattern: Regex,
}

impl TripRequestValidator {
    pub fn new() -> Result<Self, itinera_guard::Error> {
        Ok(Self {
            sanitizer: InputSanitizer::new()?,
            detector: PromptInjectionDetector::new()?,
            budget_pattern: Regex::new(
                r"^(?:[€$£]\s*\d+(?:[.,]\d+)?|\d+(?:[.,]\d+)?\s*(?:[A-Za-z]{3}|[€$£])?)$",
            )?,
        })
    }

    /// Validate `request`, rewriting sanitized fields in place.
    pub fn validate(&self, request: &mut TripRequest) -> ValidationResult {
        let mut result = ValidationResult::default();

        request.trip_title = self.screen_text(
            "Trip title",
            &request.trip_title,
            self.sanitizer.sanitize_title(&request.trip_title),
            &mut result,
        );
        request.region = self.screen_text(
            "Region",
            &request.region,
            self.sanitizer.sanitize_region(&request.region),
            &mut result,
        );
        request.notes = self.screen_text(
            "Notes",
            &request.notes,
            self.sanitizer.sanitize_notes(&request.notes),
            &mut result,
        );
        request.amendments = self.screen_text(
            "Amendments",
            &request.amendments,
            self.sanitizer.sanitize_amendments(&request.amendments),
            &mut result,
        );

        // Previous day titles are quoted back to the planner on refinement
        if let Some(previous) = request.previous_itinerary.as_mut() {
            for plan in previous.day_plans.iter_mut() {
                let field = format!("Previous itinerary day {} title", plan.day_number);
                let sanitized = self.sanitizer.sanitize_title(&plan.title);
                plan.title = self.screen_text(&field, &plan.title, sanitized, &mut result);
            }
        }

        if request.days == 0 {
            result.errors.push("Number of days must be positive".to_string());
        } else if request.days > MAX_DAYS {
            result
                .errors
                .push(format!("Number of days cannot exceed {}", MAX_DAYS));
        }

        if request.people == 0 {
            result.errors.push("Number of people must be positive".to_string());
        } else if request.people > MAX_PEOPLE {
            result
                .errors
                .push(format!("Number of people cannot exceed {}", MAX_PEOPLE));
        }

        let budget = request.budget.trim();
        if !budget.is_empty() && !self.budget_pattern.is_match(budget) {
            result.warnings.push(
                "Budget format may be invalid. Expected format: '1500 USD' or '€2000'".to_string(),
            );
        }

        request.interests =
            self.sanitizer
                .sanitize_string_list(&request.interests, MAX_INTERESTS, MAX_INTEREST_LEN);
        if request.interests.len() > RECOMMENDED_INTERESTS {
            result.warnings.push(format!(
                "Many interests specified, the first {} weigh most",
                RECOMMENDED_INTERESTS
            ));
        }

        request.food_preferences = self.sanitizer.sanitize_string_list(
            &request.food_preferences,
            MAX_FOOD_PREFERENCES,
            MAX_FOOD_PREFERENCE_LEN,
        );

        let mut booking = Vec::new();
        for pref in &request.booking_preferences {
            let pref = pref.trim().to_lowercase();
            if BOOKING_PREFERENCES.contains(&pref.as_str()) && !booking.contains(&pref) {
                booking.push(pref);
            }
        }
        if booking.len() != request.booking_preferences.len() {
            result
                .warnings
                .push("Unknown or duplicate booking preferences were removed".to_string());
        }
        request.booking_preferences = booking;

        if let Some(dates) = &request.tentative_dates {
            if !tentative_dates_valid(dates) {
                result.warnings.push(
                    "Tentative dates format may be invalid. Expected: '2025-12-20 to 2025-12-27'"
                        .to_string(),
                );
            }
        }

        let weather = request.weather_preference.trim().to_lowercase();
        if WEATHER_PREFERENCES.contains(&weather.as_str()) {
            request.weather_preference = weather;
        } else {
            result
                .warnings
                .push("Invalid weather preference, using 'any'".to_string());
            request.weather_preference = "any".to_string();
        }

        if request.region.is_empty() {
            result
                .warnings
                .push("Region is recommended for better results".to_string());
        }
        if request.interests.is_empty() {
            result
                .warnings
                .push("Interests are recommended for personalized recommendations".to_string());
        }

        if result.is_valid() {
            tracing::debug!(warnings = result.warnings.len(), "Trip request validated");
        } else {
            tracing::warn!(
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                first_error = result.first_error().unwrap_or_default(),
                "Trip request rejected"
            );
        }

        result
    }

    /// Record sanitation and injection findings for one text field and
    /// return the value to keep.
    fn screen_text(
        &self,
        field: &str,
        original: &str,
        sanitized: String,
        result: &mut ValidationResult,
    ) -> String {
        if sanitized != original {
            result.warnings.push(format!("{} was sanitized", field));
        }
        if sanitized.is_empty() {
            return sanitized;
        }

        let detection = self.detector.detect(&sanitized);
        if detection.level >= ThreatLevel::Medium {
            tracing::warn!(field, level = %detection.level, reason = %detection.reason, "Possible prompt injection");
            result.errors.push(format!(
                "{} contains suspicious content: {}",
                field, detection.reason
            ));
        } else if detection.is_threat() {
            result
                .warnings
                .push(format!("{} looks unusual: {}", field, detection.reason));
        }
        if !self.sanitizer.is_safe_for_llm(&sanitized) {
            result
                .errors
                .push(format!("{} contains script or template syntax", field));
        }
        sanitized
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Accepts one ISO date, `start to end`, `start,end`, or a list of ISO dates.
fn tentative_dates_valid(dates: &TentativeDates) -> bool {
    match dates {
        TentativeDates::List(items) => items.iter().all(|d| parse_date(d).is_some()),
        TentativeDates::Range(text) => {
            let text = text.trim();
            if text.is_empty() {
                return true;
            }
            let parts: Vec<&str> = if text.contains(" to ") {
                text.split(" to ").collect()
            } else {
                text.split(',').collect()
            };
            match parts.as_slice() {
                [single] => parse_date(single).is_some(),
                [start, end] => match (parse_date(start), parse_date(end)) {
                    (Some(start), Some(end)) => start <= end,
                    _ => false,
                },
                _ => false,
            }
        }
    }
}
