//! # Web Handlers for the Campsite Reservation Backend
//!
//! This crate provides the web handlers for the campsite reservation API.

/// Handlers for the reservation API endpoints
mod reservation_handlers;
pub use reservation_handlers::*;

/// Request and response types for the reservation API
mod reservation_types;
pub use reservation_types::*;
