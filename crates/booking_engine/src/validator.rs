use chrono::NaiveDate;

use crate::calendar::WINDOW_SIZE;
use crate::error::ReservationError;

/// Maximum number of nights a single reservation may cover.
pub const MAX_STAY_NIGHTS: i64 = 3;

/// Validates the booking rules for a candidate reservation against the
/// current date. The first failing rule determines the reported error, so
/// rule order is part of the contract:
///
/// 1. email and full name must be non-blank
/// 2. check-out must not fall before check-in
/// 3. the stay must not exceed [`MAX_STAY_NIGHTS`] nights
/// 4. check-in must not be in the past
/// 5. check-in must not be the current day
/// 6. check-in must be at most [`WINDOW_SIZE`] days ahead
pub fn validate_booking(
    check_in: NaiveDate,
    check_out: NaiveDate,
    email: &str,
    full_name: &str,
    current_date: NaiveDate,
) -> Result<(), ReservationError> {
    if email.trim().is_empty() || full_name.trim().is_empty() {
        return Err(ReservationError::MissingField);
    }

    let stay_nights = (check_out - check_in).num_days();

    if stay_nights < 0 {
        return Err(ReservationError::InvertedRange);
    }

    if stay_nights > MAX_STAY_NIGHTS {
        return Err(ReservationError::StayTooLong);
    }

    let days_until_check_in = (check_in - current_date).num_days();

    if days_until_check_in < 0 {
        return Err(ReservationError::PastDate);
    }

    if days_until_check_in == 0 {
        return Err(ReservationError::SameDayBooking);
    }

    if days_until_check_in > WINDOW_SIZE as i64 {
        return Err(ReservationError::TooFarAhead);
    }

    Ok(())
}
