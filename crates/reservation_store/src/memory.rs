use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::store::{ReservationStore, StoreError};
use crate::types::Reservation;

/// In-memory reservation store backed by a `HashMap`. Used by the engine
/// tests in place of PostgreSQL and usable for store-less local runs.
#[derive(Default)]
pub struct MemoryReservationStore {
    reservations: RwLock<HashMap<String, Reservation>>,
}

impl MemoryReservationStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reservations currently held, cancelled ones included.
    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    /// True when the store holds no reservations.
    pub async fn is_empty(&self) -> bool {
        self.reservations.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn save(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id.clone(), reservation.clone());
        Ok(reservation.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(id).cloned())
    }

    async fn find_by_check_in_on_or_after(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        let mut matches: Vec<Reservation> = reservations
            .values()
            .filter(|reservation| reservation.check_in >= date)
            .cloned()
            .collect();
        matches.sort_by_key(|reservation| reservation.check_in);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn save_then_find_by_id() {
        let store = MemoryReservationStore::new();
        let reservation =
            Reservation::new(date("2020-03-05"), date("2020-03-08"), "john@doe.com", "John Doe");

        store.save(&reservation).await.unwrap();

        let found = store.find_by_id(&reservation.id).await.unwrap();
        assert_eq!(found, Some(reservation));
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_by_id() {
        let store = MemoryReservationStore::new();
        let mut reservation =
            Reservation::new(date("2020-03-05"), date("2020-03-08"), "john@doe.com", "John Doe");
        store.save(&reservation).await.unwrap();

        reservation.cancelled = true;
        store.save(&reservation).await.unwrap();

        assert_eq!(store.len().await, 1);
        let found = store.find_by_id(&reservation.id).await.unwrap().unwrap();
        assert!(found.cancelled);
    }

    #[tokio::test]
    async fn find_by_check_in_on_or_after_filters_and_sorts() {
        let store = MemoryReservationStore::new();
        let past = Reservation::new(date("2020-02-20"), date("2020-02-22"), "a@b.com", "A B");
        let near = Reservation::new(date("2020-03-02"), date("2020-03-04"), "c@d.com", "C D");
        let far = Reservation::new(date("2020-03-10"), date("2020-03-12"), "e@f.com", "E F");
        for reservation in [&far, &past, &near] {
            store.save(reservation).await.unwrap();
        }

        let found = store
            .find_by_check_in_on_or_after(date("2020-03-01"))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, near.id);
        assert_eq!(found[1].id, far.id);
    }
}
