//! HTTP API Handlers and Routes
//!
//! REST layer of the itinerary server, built on Axum.
//!
//! # API Endpoints
//!
//! ## Itineraries (`/api/itineraries`)
//! - `POST /api/itineraries/questions` - Clarifying questions for a trip request
//! - `POST /api/itineraries` - Generate an itinerary, or refine one when the
//!   request carries `amendments` and a `previousItinerary`
//!
//! ## Misc
//! - `GET /health` - Liveness probe, answers `OK`
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! Every request body is validated and sanitized first; rejected requests get
//! `400` with an `{"error": ...}` body. Provider failures and agent timeouts
//! answer `500` with the same body shape.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    Activity, Booking, ClarifyingQuestion, DayPlan, FlightBooking, HotelBooking, Itinerary,
    QuestionResponse, QuestionType, SpecialNeeds, TentativeDates, TransportBooking, TripRequest,
};
use utoipa::OpenApi;

/// OpenAPI description of the server
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::itinerary::generate_questions,
        handlers::itinerary::create_itinerary,
        handlers::health::health,
    ),
    components(schemas(
        TripRequest,
        SpecialNeeds,
        TentativeDates,
        Itinerary,
        DayPlan,
        Activity,
        Booking,
        FlightBooking,
        TransportBooking,
        HotelBooking,
        QuestionResponse,
        ClarifyingQuestion,
        QuestionType,
    )),
    tags(
        (name = "itineraries", description = "Trip questions and itinerary generation"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
