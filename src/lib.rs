// Main library file for the hotel booking gateway

pub mod circuit_breaker;
pub mod config;
pub mod degrade;
pub mod discovery;
pub mod error;
pub mod format;
pub mod gateway;
pub mod mock_server;
pub mod models;
pub mod orchestrator;
pub mod rpc;
pub mod token;
pub mod tools;
pub mod transport;

// Re-export key types for convenience
pub use config::{CircuitBreakerConfig, GatewayConfig};
pub use error::{ApiError, ClientError, ErrorClassification};
pub use models::{BookingConfirmation, BookingRequest, HotelListQuery, HotelSummary, OfferQuery};
pub use orchestrator::{HotelService, Sourced};
pub use token::{AccessToken, TokenManager};
