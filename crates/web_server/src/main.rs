//! Main entry point for the campsite reservation backend server.
//! This crate wires the booking engine to its collaborators and exposes the
//! reservation REST API.

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};

use booking_engine::{EngineConfig, ReservationEngine, SystemClock};
use reservation_store::PgReservationStore;
use reservation_store::postgres::{create_connection_pool, test_connection};
use web_handlers::*;

mod rotation;
use rotation::RotationScheduler;

fn engine_config_from_env() -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Ok(seconds) = std::env::var("LOCK_MAX_WAIT_SECONDS") {
        match seconds.parse::<u64>() {
            Ok(seconds) => config.lock_timeout = std::time::Duration::from_secs(seconds),
            Err(_) => log::warn!("Ignoring invalid LOCK_MAX_WAIT_SECONDS value: {}", seconds),
        }
    }
    config
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🏕️ Starting campsite reservation server...");

    // Create database connection pool
    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Make sure PostgreSQL is running and DATABASE_URL is set");
            std::process::exit(1);
        }
    };

    // Build the reservation engine over the durable store
    let store = Arc::new(PgReservationStore::new(pool));
    let clock = Arc::new(SystemClock);
    let engine = Arc::new(ReservationEngine::new(
        store,
        clock,
        Some(engine_config_from_env()),
    ));

    // Project the store into the availability window before serving requests
    if let Err(e) = engine.rebuild_from_store().await {
        log::error!("❌ Failed to restore reservations from the store: {}", e);
        std::process::exit(1);
    }
    log::info!("📅 Availability window restored from the store");

    // Start the daily rotation of the availability window
    let _rotation = RotationScheduler::start(engine.clone());

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("🌐 Server will be available at: http://{}", bind_addr);
    log::info!("📖 GET /reservations/availableDates?nbDays=<n> lists open days");
    log::info!("📖 POST /reservations books, PUT and DELETE /reservations/<id> modify and cancel");

    let engine_data = web::Data::from(engine);

    HttpServer::new(move || {
        App::new()
            .app_data(engine_data.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/reservations")
                    .route("/availableDates", web::get().to(get_available_dates))
                    .route("", web::post().to(create_reservation))
                    .route("/{reservationId}", web::put().to(modify_reservation))
                    .route("/{reservationId}", web::delete().to(cancel_reservation)),
            )
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
