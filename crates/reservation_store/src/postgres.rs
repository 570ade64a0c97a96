use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use crate::store::{ReservationStore, StoreError};
use crate::types::Reservation;

/// Creates a connection pool to the PostgreSQL database.
pub async fn create_connection_pool() -> Result<PgPool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/campsite_reservations".to_string());

    PgPool::connect(&database_url).await
}

/// Tests the database connection by executing a simple query.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT 1 as test").fetch_one(pool).await?;

    let test_value: i32 = row.get("test");
    println!(
        "✅ Database connection successful! Test value: {}",
        test_value
    );

    Ok(())
}

/// PostgreSQL-backed reservation store.
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    /// Creates a new instance of `PgReservationStore` with the provided
    /// database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn reservation_from_row(row: &sqlx::postgres::PgRow) -> Reservation {
        Reservation {
            id: row.get("id"),
            check_in: row.get("check_in"),
            check_out: row.get("check_out"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            cancelled: row.get("cancelled"),
        }
    }
}

#[async_trait::async_trait]
impl ReservationStore for PgReservationStore {
    async fn save(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO reservations (
                id, check_in, check_out, email, full_name, cancelled
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                check_in = EXCLUDED.check_in,
                check_out = EXCLUDED.check_out,
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                cancelled = EXCLUDED.cancelled
            RETURNING
                id, check_in, check_out, email, full_name, cancelled
            "#,
        )
        .bind(&reservation.id)
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .bind(&reservation.email)
        .bind(&reservation.full_name)
        .bind(reservation.cancelled)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::reservation_from_row(&row))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, check_in, check_out, email, full_name, cancelled
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::reservation_from_row))
    }

    async fn find_by_check_in_on_or_after(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, check_in, check_out, email, full_name, cancelled
            FROM reservations
            WHERE check_in >= $1
            ORDER BY check_in
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::reservation_from_row).collect())
    }
}
