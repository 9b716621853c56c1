use crate::{
    AppState,
    itinerary::AgentCoordinator,
    types::{AppError, Itinerary, QuestionResponse, Result, TripRequest},
};
use axum::{Json, extract::State};
use std::time::Instant;

/// Validate and sanitize the payload, turning errors into a 400.
fn checked(state: &AppState, mut request: TripRequest) -> Result<TripRequest> {
    let validation = state.validator.validate(&mut request);
    if !validation.is_valid() {
        return Err(AppError::InvalidInput(validation.errors.join("; ")));
    }
    if !validation.warnings.is_empty() {
        tracing::info!(warnings = ?validation.warnings, "Trip request accepted with warnings");
    }
    Ok(request)
}

fn coordinator(state: &AppState) -> AgentCoordinator {
    AgentCoordinator::new(state.llm.clone(), state.config_manager.config())
}

/// Ask for clarifying questions about a trip
#[utoipa::path(
    post,
    path = "/api/itineraries/questions",
    request_body = TripRequest,
    responses(
        (status = 200, description = "Clarifying questions", body = QuestionResponse),
        (status = 400, description = "Invalid trip request"),
        (status = 500, description = "Model provider failure")
    ),
    tag = "itineraries"
)]
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(payload): Json<TripRequest>,
) -> Result<Json<QuestionResponse>> {
    tracing::info!(title = %payload.trip_title, "Generating questions");
    let request = checked(&state, payload)?;

    let response = coordinator(&state)
        .generate_questions(&request)
        .await
        .inspect_err(|e| tracing::error!(title = %request.trip_title, error = %e, "Question generation failed"))?;

    Ok(Json(response))
}

/// Create an itinerary, or refine one when amendments and a previous
/// itinerary are supplied
#[utoipa::path(
    post,
    path = "/api/itineraries",
    request_body = TripRequest,
    responses(
        (status = 200, description = "Generated itinerary", body = Itinerary),
        (status = 400, description = "Invalid trip request"),
        (status = 500, description = "Model provider failure or timeout")
    ),
    tag = "itineraries"
)]
pub async fn create_itinerary(
    State(state): State<AppState>,
    Json(payload): Json<TripRequest>,
) -> Result<Json<Itinerary>> {
    let start = Instant::now();
    tracing::info!(title = %payload.trip_title, "Creating itinerary");
    let request = checked(&state, payload)?;
    let title = request.trip_title.clone();

    let itinerary = coordinator(&state)
        .generate_itinerary(request)
        .await
        .inspect_err(|e| tracing::error!(title = %title, error = %e, "Itinerary generation failed"))?;

    tracing::info!(
        title = %title,
        duration_ms = start.elapsed().as_millis() as u64,
        "Itinerary created"
    );
    Ok(Json(itinerary))
}
