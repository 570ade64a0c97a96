use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A campsite reservation as persisted in the store.
///
/// Check-in and check-out are local calendar dates in the campsite timezone;
/// check-in and check-out times are always 12:00 AM, so the time portion is
/// omitted. The check-out date is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Opaque unique identifier, generated on creation and never reused.
    pub id: String,

    /// Check-in date.
    #[serde(rename = "checkInDate")]
    pub check_in: NaiveDate,

    /// Check-out date (exclusive).
    #[serde(rename = "checkOutDate")]
    pub check_out: NaiveDate,

    /// Email of the person holding the reservation.
    pub email: String,

    /// Full name of the person holding the reservation.
    pub full_name: String,

    /// True once the reservation has been cancelled. Never cleared.
    pub cancelled: bool,
}

impl Reservation {
    /// Builds a new reservation with a freshly generated identifier.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate, email: &str, full_name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            check_in,
            check_out,
            email: email.to_string(),
            full_name: full_name.to_string(),
            cancelled: false,
        }
    }

    /// Applies a partial update, overwriting only the fields the update
    /// actually carries. Blank strings count as absent.
    pub fn apply_update(&mut self, update: &ReservationUpdate) {
        if let Some(check_in) = update.check_in {
            self.check_in = check_in;
        }
        if let Some(check_out) = update.check_out {
            self.check_out = check_out;
        }
        if let Some(email) = &update.email {
            if !email.trim().is_empty() {
                self.email = email.clone();
            }
        }
        if let Some(full_name) = &update.full_name {
            if !full_name.trim().is_empty() {
                self.full_name = full_name.clone();
            }
        }
    }
}

/// Partial update to an existing reservation. `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    /// New check-in date, if changing.
    #[serde(rename = "checkInDate")]
    pub check_in: Option<NaiveDate>,

    /// New check-out date, if changing.
    #[serde(rename = "checkOutDate")]
    pub check_out: Option<NaiveDate>,

    /// New contact email, if changing.
    pub email: Option<String>,

    /// New full name, if changing.
    pub full_name: Option<String>,
}
