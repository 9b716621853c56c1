//! # Itinera - agentic trip itinerary server
//!
//! Turns a structured trip request into a day-by-day itinerary by consulting
//! a set of model-backed agents (flights, hotels, ground transport, events,
//! weather), then handing their findings to a planner agent.
//!
//! ## Overview
//!
//! Itinera can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `itinera-server` binary
//! 2. **As a library** - Drive [`AgentCoordinator`] from your own code
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use itinera::{AgentCoordinator, ItineraConfig, Provider, TripRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ItineraConfig::load("itinera.toml")?;
//!     let llm = Provider::from_config(&config.provider)?.create_client()?;
//!
//!     let coordinator = AgentCoordinator::new(llm, Arc::new(config));
//!     let itinerary = coordinator
//!         .generate_itinerary(TripRequest {
//!             trip_title: "Lisbon long weekend".into(),
//!             days: 3,
//!             people: 2,
//!             region: "Lisbon".into(),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("{}", itinerary.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default); without it only the OpenAI-compatible client is built |
//!
//! ## Modules
//!
//! - [`agents`] - Domain, question and planner agents
//! - [`itinerary`] - Fan-out coordinator and response mapper
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - Model provider clients
//! - [`validation`] - Request sanitization and checks
//! - [`types`] - Request/response model and error handling
//! - [`utils`] - TOML configuration with hot reload

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Model-backed travel agents.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface of the server binary.
pub mod cli;
/// Itinerary coordination and response mapping.
pub mod itinerary;
/// LLM provider clients and abstractions.
pub mod llm;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// Trip request validation.
pub mod validation;

// Re-export commonly used types
pub use itinerary::AgentCoordinator;
pub use llm::{LLMClient, Provider};
pub use types::{AppError, Itinerary, QuestionResponse, Result, TripRequest};
pub use utils::toml_config::{ConfigManager, ItineraConfig};
pub use validation::TripRequestValidator;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// Model client shared by every agent
    pub llm: Arc<dyn LLMClient>,
    /// Request sanitizer and validator
    pub validator: Arc<TripRequestValidator>,
}

/// Build the complete application: routes, CORS, body limit and request tracing.
///
/// Layer settings are read from the configuration current at call time.
pub fn build_app(state: AppState) -> Result<Router> {
    let server = state.config_manager.config().server.clone();

    let allow_origin = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = server
            .cors_allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    AppError::Configuration(format!("Invalid CORS origin '{}': {}", origin, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        tracing::info_span!(
            "request",
            request_id = %uuid::Uuid::new_v4(),
            method = %req.method(),
            uri = %req.uri(),
        )
    });

    Ok(api::routes::app_router()
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors)
        .layer(trace)
        .with_state(state))
}
