use chrono::NaiveDate;
use reservation_store::StoreError;

/// Custom error type for reservation operations
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// A required reservation field is missing or blank
    #[error("Cannot create reservation with missing required field(s)")]
    MissingField,

    /// Check-out date falls before check-in date
    #[error("Check-out date must be after check-in date")]
    InvertedRange,

    /// The stay exceeds the maximum length
    #[error("Cannot reserve the campsite for more than 3 days")]
    StayTooLong,

    /// Check-in date is in the past
    #[error("Cannot reserve the campsite in the past")]
    PastDate,

    /// Check-in date is the current day
    #[error("Cannot reserve the campsite for the current day")]
    SameDayBooking,

    /// Check-in date is beyond the availability window
    #[error("Cannot reserve the campsite more than a month in advance")]
    TooFarAhead,

    /// A day in the requested range is already reserved
    #[error("Day already reserved {date}")]
    DateConflict {
        /// First already-reserved day in the requested range
        date: NaiveDate,
    },

    /// No reservation exists with the given id
    #[error("Reservation not found")]
    NotFound,

    /// A day lock could not be acquired in time
    #[error(
        "Failed to execute operation on reservations due to high volume, please try again later"
    )]
    LockTimeout,

    /// The date is too far from the current date to be indexed
    #[error("Difference between the current date and {date} is too big")]
    IndexOverflow {
        /// Date whose offset from the current date is not representable
        date: NaiveDate,
    },

    /// Request-level validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl actix_web::ResponseError for ReservationError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            ReservationError::MissingField
            | ReservationError::InvertedRange
            | ReservationError::StayTooLong
            | ReservationError::PastDate
            | ReservationError::SameDayBooking
            | ReservationError::TooFarAhead => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_reservation",
                "message": self.to_string()
            })),
            ReservationError::IndexOverflow { .. } => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_reservation",
                    "message": self.to_string()
                }))
            }
            ReservationError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            ReservationError::DateConflict { .. } => {
                HttpResponse::Conflict().json(serde_json::json!({
                    "error": "date_conflict",
                    "message": self.to_string()
                }))
            }
            ReservationError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "reservation_not_found",
                "message": "Reservation not found"
            })),
            ReservationError::LockTimeout => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "overloaded",
                    "message": self.to_string()
                }))
            }
            ReservationError::Store(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}
