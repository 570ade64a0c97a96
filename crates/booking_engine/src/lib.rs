//! # Booking Engine
//!
//! This crate provides the availability engine for the campsite reservation
//! backend: the rolling availability window, the per-day range locks that let
//! non-overlapping reservations proceed in parallel, the booking-rule
//! validator, and the reservation engine that orchestrates them against the
//! durable store.

/// Rolling availability window over the next bookable days.
pub mod calendar;
/// Current-date source, substitutable in tests.
pub mod clock;
/// Reservation engine orchestrating validator, locks, window and store.
pub mod engine;
/// Error taxonomy surfaced by the engine.
pub mod error;
/// Striped per-day locks with ordered range acquisition.
pub mod locks;
/// Booking-rule validation.
pub mod validator;

pub use calendar::{CalendarWindow, WINDOW_SIZE};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{EngineConfig, ReservationEngine};
pub use error::ReservationError;
pub use locks::{RangeGuard, StripedLocks};
pub use validator::{MAX_STAY_NIGHTS, validate_booking};
