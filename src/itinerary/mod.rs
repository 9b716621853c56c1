//! Itinerary assembly
//!
//! [`AgentCoordinator`] fans a [`TripRequest`](crate::types::TripRequest) out
//! to the five domain agents, joins their results, hands them to the planner
//! and finally runs the [`mapper`] to build the
//! [`Itinerary`](crate::types::Itinerary) returned to the client.

pub mod coordinator;
pub mod mapper;

pub use coordinator::{AgentCoordinator, Mode};
pub use mapper::Mapped;
