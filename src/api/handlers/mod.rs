//! API request handlers.

/// Liveness probe.
pub mod health;
/// Question and itinerary handlers.
pub mod itinerary;
