use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request structure for creating a reservation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    /// Check-in date for the stay
    pub check_in_date: NaiveDate,

    /// Check-out date for the stay (exclusive)
    pub check_out_date: NaiveDate,

    /// Email of the person making the reservation
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Full name of the person making the reservation
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
}

/// Request structure for modifying a reservation. Absent fields keep their
/// current value.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModifyReservationRequest {
    /// New check-in date, if changing
    pub check_in_date: Option<NaiveDate>,

    /// New check-out date, if changing
    pub check_out_date: Option<NaiveDate>,

    /// New contact email, if changing
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,

    /// New full name, if changing
    pub full_name: Option<String>,
}

/// Query parameters for the available-dates endpoint
#[derive(Debug, Deserialize)]
pub struct AvailableDatesQuery {
    /// Number of days ahead to check
    #[serde(rename = "nbDays")]
    pub nb_days: i64,
}

/// Response structure listing the available dates
#[derive(Debug, Serialize)]
pub struct DatesListResponse {
    /// Days where the campsite is available for reservation, ascending
    pub dates: Vec<NaiveDate>,
}

/// Response structure carrying a newly created reservation id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationIdResponse {
    /// Identifier of the created reservation
    pub reservation_id: String,
}
