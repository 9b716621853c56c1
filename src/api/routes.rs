use crate::AppState;
use crate::api::ApiDoc;
use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/itineraries",
            post(crate::api::handlers::itinerary::create_itinerary),
        )
        .route(
            "/itineraries/questions",
            post(crate::api::handlers::itinerary::generate_questions),
        )
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

/// Full application router: `/health` plus the `/api` routes.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(crate::api::handlers::health::health))
        .nest("/api", create_router())
}
