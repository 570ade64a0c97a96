use actix_web::{HttpResponse, web};
use validator::Validate;

use booking_engine::{ReservationEngine, ReservationError};
use reservation_store::ReservationUpdate;

use crate::reservation_types::*;

/// Lists the days where the campsite is available for reservation
pub async fn get_available_dates(
    engine: web::Data<ReservationEngine>,
    query: web::Query<AvailableDatesQuery>,
) -> Result<HttpResponse, ReservationError> {
    let nb_days = query.nb_days.max(0) as usize;
    let dates = engine.available_dates(nb_days);

    Ok(HttpResponse::Ok().json(DatesListResponse { dates }))
}

/// Creates a new reservation and returns its id
pub async fn create_reservation(
    engine: web::Data<ReservationEngine>,
    request: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, ReservationError> {
    request
        .validate()
        .map_err(|e| ReservationError::Validation(format!("Validation error: {}", e)))?;

    let reservation_id = engine
        .create_reservation(
            request.check_in_date,
            request.check_out_date,
            &request.email,
            &request.full_name,
        )
        .await?;

    Ok(HttpResponse::Created().json(ReservationIdResponse { reservation_id }))
}

/// Applies a partial update to an existing reservation
pub async fn modify_reservation(
    engine: web::Data<ReservationEngine>,
    path: web::Path<String>,
    request: web::Json<ModifyReservationRequest>,
) -> Result<HttpResponse, ReservationError> {
    request
        .validate()
        .map_err(|e| ReservationError::Validation(format!("Validation error: {}", e)))?;

    let reservation_id = path.into_inner();
    let update = ReservationUpdate {
        check_in: request.check_in_date,
        check_out: request.check_out_date,
        email: request.email.clone(),
        full_name: request.full_name.clone(),
    };

    let reservation = engine.modify_reservation(&reservation_id, &update).await?;

    Ok(HttpResponse::Ok().json(reservation))
}

/// Cancels a reservation and returns it with its cancelled flag set
pub async fn cancel_reservation(
    engine: web::Data<ReservationEngine>,
    path: web::Path<String>,
) -> Result<HttpResponse, ReservationError> {
    let reservation_id = path.into_inner();
    let reservation = engine.cancel_reservation(&reservation_id).await?;

    Ok(HttpResponse::Ok().json(reservation))
}
