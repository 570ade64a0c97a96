//! # Reservation Store
//!
//! This crate provides the durable reservation store for the campsite
//! reservation backend: the reservation record itself, the store trait that
//! the booking engine programs against, and its PostgreSQL and in-memory
//! implementations.

/// In-memory store implementation, used by tests and local runs.
pub mod memory;
/// PostgreSQL-backed store implementation.
pub mod postgres;
/// Store trait and store error type.
pub mod store;
/// Reservation record and partial-update types.
pub mod types;

pub use memory::MemoryReservationStore;
pub use postgres::PgReservationStore;
pub use store::{ReservationStore, StoreError};
pub use types::{Reservation, ReservationUpdate};
