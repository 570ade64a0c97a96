use chrono::NaiveDate;

use crate::types::Reservation;

/// Custom error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable store for reservations. The store is the system of record; the
/// booking engine keeps only a derived in-memory projection that it rebuilds
/// from here at startup.
#[async_trait::async_trait]
pub trait ReservationStore: Send + Sync {
    /// Persists a reservation, inserting or overwriting by id.
    async fn save(&self, reservation: &Reservation) -> Result<Reservation, StoreError>;

    /// Looks a reservation up by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, StoreError>;

    /// Returns every reservation whose check-in date is on or after the
    /// given date.
    async fn find_by_check_in_on_or_after(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError>;
}
