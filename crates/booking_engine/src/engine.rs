use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use reservation_store::{Reservation, ReservationStore, ReservationUpdate};

use crate::calendar::{CalendarWindow, WINDOW_SIZE};
use crate::clock::Clock;
use crate::error::ReservationError;
use crate::locks::StripedLocks;
use crate::validator::validate_booking;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum time to wait for any single day lock (default: 3 seconds)
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(3),
        }
    }
}

/// Contiguous run of day indices covered by a stay, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DaySpan {
    start: usize,
    end: usize,
}

impl DaySpan {
    fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }
}

/// Reservation engine for the single campsite.
///
/// Every mutating operation shares one shape: validate, compute the day-index
/// range the stay touches, acquire exactly that contiguous range of day
/// locks, re-check availability under the locks, persist to the store, then
/// update the availability window. Availability queries read the window
/// without locks and may observe a state that a concurrent operation is in
/// the middle of changing; staleness is bounded by the duration of one locked
/// operation.
pub struct ReservationEngine {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    calendar: CalendarWindow,
    locks: StripedLocks,
}

impl ReservationEngine {
    /// Creates an engine over the given store and clock. The availability
    /// window starts empty; call [`rebuild_from_store`](Self::rebuild_from_store)
    /// once at startup to project the store into it.
    pub fn new(
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        config: Option<EngineConfig>,
    ) -> Self {
        let config = config.unwrap_or_default();
        Self {
            store,
            clock,
            calendar: CalendarWindow::new(),
            locks: StripedLocks::new(WINDOW_SIZE, config.lock_timeout),
        }
    }

    /// Rebuilds the availability window from the store. Called once at
    /// process start, before the engine serves requests.
    pub async fn rebuild_from_store(&self) -> Result<(), ReservationError> {
        let current_date = self.clock.current_date();
        let reservations = self.store.find_by_check_in_on_or_after(current_date).await?;

        self.calendar.reset();
        let mut restored = 0;
        for reservation in &reservations {
            if reservation.cancelled {
                continue;
            }
            if let Some(span) =
                stay_span(current_date, reservation.check_in, reservation.check_out)?
            {
                self.calendar.set_range(span.start, span.end, true);
                restored += 1;
            }
        }

        info!("Restored {} reservations into the availability window", restored);
        Ok(())
    }

    /// Returns the days where the campsite is available for reservation,
    /// in ascending order, looking at most `nb_days` ahead.
    ///
    /// Reads the live window without taking any day lock.
    pub fn available_dates(&self, nb_days: usize) -> Vec<NaiveDate> {
        info!("Getting available dates list");

        let nb_days = nb_days.min(WINDOW_SIZE);
        let current_date = self.clock.current_date();
        let snapshot = self.calendar.snapshot();

        (0..nb_days)
            .filter(|&index| !snapshot[index])
            .map(|index| index_to_date(current_date, index))
            .collect()
    }

    /// Makes a reservation, stores it and marks its days occupied.
    /// Returns the generated reservation id.
    pub async fn create_reservation(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        email: &str,
        full_name: &str,
    ) -> Result<String, ReservationError> {
        info!("Creating new reservation from {} to {}", check_in, check_out);

        let current_date = self.clock.current_date();
        validate_booking(check_in, check_out, email, full_name, current_date)?;

        let reservation = Reservation::new(check_in, check_out, email, full_name);

        let Some(span) = stay_span(current_date, check_in, check_out)? else {
            // zero-night stay: no days to claim, nothing to lock
            self.store.save(&reservation).await?;
            return Ok(reservation.id);
        };

        let _guard = self.locks.lock_range(span.start, span.end).await?;

        if let Some(index) = self.first_occupied(span, None) {
            return Err(ReservationError::DateConflict {
                date: index_to_date(current_date, index),
            });
        }

        self.store.save(&reservation).await?;
        self.calendar.set_range(span.start, span.end, true);

        Ok(reservation.id)
    }

    /// Updates an existing reservation. Only the fields present in the
    /// update are applied; an update that changes nothing returns the
    /// reservation as-is without locking or persisting.
    pub async fn modify_reservation(
        &self,
        id: &str,
        update: &ReservationUpdate,
    ) -> Result<Reservation, ReservationError> {
        info!("Updating reservation having id {}", id);

        let current_date = self.clock.current_date();
        let original = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound)?;

        let mut merged = original.clone();
        merged.apply_update(update);

        if merged == original {
            debug!("Update to reservation {} changes nothing", id);
            return Ok(original);
        }

        validate_booking(
            merged.check_in,
            merged.check_out,
            &merged.email,
            &merged.full_name,
            current_date,
        )?;

        let old_span = stay_span(current_date, original.check_in, original.check_out)?;
        let new_span = stay_span(current_date, merged.check_in, merged.check_out)?;

        // a single contiguous super-range covering the vacated and the newly
        // claimed days, so both transitions happen under one lock hold
        let union = match (old_span, new_span) {
            (Some(old), Some(new)) => Some(DaySpan {
                start: old.start.min(new.start),
                end: old.end.max(new.end),
            }),
            (Some(span), None) | (None, Some(span)) => Some(span),
            (None, None) => None,
        };

        let _guard = match union {
            Some(union) => Some(self.locks.lock_range(union.start, union.end).await?),
            None => None,
        };

        // the conflict check skips days the original stay already holds,
        // and runs before anything is freed so failure needs no rollback
        if let Some(new) = new_span {
            if let Some(index) = self.first_occupied(new, old_span) {
                return Err(ReservationError::DateConflict {
                    date: index_to_date(current_date, index),
                });
            }
        }

        let saved = self.store.save(&merged).await?;

        if let Some(old) = old_span {
            self.calendar.set_range(old.start, old.end, false);
        }
        if let Some(new) = new_span {
            self.calendar.set_range(new.start, new.end, true);
        }

        Ok(saved)
    }

    /// Cancels a reservation, marking it cancelled in the store and freeing
    /// its days. Cancelling does not re-validate the stay; freeing always
    /// succeeds. Cancelling an already-cancelled reservation changes nothing.
    pub async fn cancel_reservation(&self, id: &str) -> Result<Reservation, ReservationError> {
        info!("Cancelling reservation with id {}", id);

        let current_date = self.clock.current_date();
        let mut reservation = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound)?;

        if reservation.cancelled {
            // its days were already freed; freeing again could steal days
            // that have since been rebooked
            return Ok(reservation);
        }

        reservation.cancelled = true;

        let Some(span) = stay_span(current_date, reservation.check_in, reservation.check_out)?
        else {
            self.store.save(&reservation).await?;
            return Ok(reservation);
        };

        let _guard = self.locks.lock_range(span.start, span.end).await?;
        self.store.save(&reservation).await?;
        self.calendar.set_range(span.start, span.end, false);

        Ok(reservation)
    }

    /// Shifts the availability window forward by one day. Invoked once per
    /// day boundary by the rotation scheduler. Takes every day lock so no
    /// reservation operation can observe a half-rotated window.
    pub async fn roll_window(&self) -> Result<(), ReservationError> {
        info!("Moving reserved dates to next day");

        let _guard = self.locks.lock_range(0, WINDOW_SIZE - 1).await?;
        self.calendar.rotate_forward();

        Ok(())
    }

    /// First occupied index in `span`, ignoring indices inside `skip`.
    fn first_occupied(&self, span: DaySpan, skip: Option<DaySpan>) -> Option<usize> {
        (span.start..=span.end).find(|&index| {
            if skip.is_some_and(|skip| skip.contains(index)) {
                return false;
            }
            self.calendar.is_occupied(index)
        })
    }
}

/// Zero-based day index of `date`: the number of days between the current
/// date and `date`, minus one, so that index 0 is tomorrow.
fn day_index(current_date: NaiveDate, date: NaiveDate) -> Result<i64, ReservationError> {
    let days = (date - current_date).num_days();
    if i32::try_from(days).is_err() {
        return Err(ReservationError::IndexOverflow { date });
    }
    Ok(days - 1)
}

/// Day-index span occupied by the stay `[check_in, check_out)`, clipped to
/// the window. The check-out day itself stays free. Returns `None` when the
/// stay occupies no day inside the window, which covers zero-night stays and
/// the parts of a stay that have already begun or spill past the horizon.
fn stay_span(
    current_date: NaiveDate,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Option<DaySpan>, ReservationError> {
    let start = day_index(current_date, check_in)?.max(0);
    let end = (day_index(current_date, check_out)? - 1).min(WINDOW_SIZE as i64 - 1);

    if end < start {
        return Ok(None);
    }

    Ok(Some(DaySpan {
        start: start as usize,
        end: end as usize,
    }))
}

fn index_to_date(current_date: NaiveDate, index: usize) -> NaiveDate {
    current_date + Days::new(index as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    use reservation_store::{MemoryReservationStore, StoreError};
    use tokio::sync::Notify;

    use crate::clock::FixedClock;

    const EMAIL: &str = "john.doe@email.com";
    const NAME: &str = "John Doe";

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn engine_at(current: &str) -> (Arc<ReservationEngine>, Arc<MemoryReservationStore>) {
        let store = Arc::new(MemoryReservationStore::new());
        let clock = Arc::new(FixedClock::new(date(current)));
        let engine = Arc::new(ReservationEngine::new(store.clone(), clock, None));
        (engine, store)
    }

    async fn create(
        engine: &ReservationEngine,
        check_in: &str,
        check_out: &str,
    ) -> Result<String, ReservationError> {
        engine
            .create_reservation(date(check_in), date(check_out), EMAIL, NAME)
            .await
    }

    #[test]
    fn stay_span_covers_the_nights_not_the_check_out_day() {
        let current = date("2020-03-01");
        let span = stay_span(current, date("2020-03-03"), date("2020-03-05"))
            .unwrap()
            .unwrap();
        assert_eq!(span, DaySpan { start: 1, end: 2 });
    }

    #[test]
    fn stay_span_is_empty_for_a_zero_night_stay() {
        let current = date("2020-03-01");
        let span = stay_span(current, date("2020-03-03"), date("2020-03-03")).unwrap();
        assert!(span.is_none());
    }

    #[test]
    fn stay_span_is_clipped_to_the_window() {
        let current = date("2020-03-01");

        // stay spilling past the horizon keeps only its in-window days
        let span = stay_span(current, date("2020-04-01"), date("2020-04-04"))
            .unwrap()
            .unwrap();
        assert_eq!(span, DaySpan { start: 30, end: 30 });

        // ongoing stay keeps only its remaining days
        let span = stay_span(current, date("2020-02-28"), date("2020-03-03"))
            .unwrap()
            .unwrap();
        assert_eq!(span, DaySpan { start: 0, end: 1 });
    }

    #[tokio::test]
    async fn create_occupies_exactly_the_stay_nights() {
        let (engine, _) = engine_at("2020-03-01");

        create(&engine, "2020-03-03", "2020-03-05").await.unwrap();

        let available = engine.available_dates(6);
        assert_eq!(
            available,
            vec![
                date("2020-03-02"),
                date("2020-03-05"),
                date("2020-03-06"),
                date("2020-03-07"),
            ]
        );
    }

    #[tokio::test]
    async fn available_dates_clamps_the_requested_horizon() {
        let (engine, _) = engine_at("2020-03-01");

        assert_eq!(engine.available_dates(100).len(), WINDOW_SIZE);
        assert_eq!(engine.available_dates(31).last(), Some(&date("2020-04-01")));
        assert!(engine.available_dates(0).is_empty());
    }

    #[tokio::test]
    async fn available_dates_is_idempotent_without_mutation() {
        let (engine, _) = engine_at("2020-03-01");
        create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        assert_eq!(engine.available_dates(31), engine.available_dates(31));
    }

    #[tokio::test]
    async fn create_rejects_an_overlapping_stay_with_the_first_reserved_day() {
        let (engine, store) = engine_at("2020-03-01");

        create(&engine, "2020-03-05", "2020-03-08").await.unwrap();
        let result = create(&engine, "2020-03-07", "2020-03-10").await;

        assert!(matches!(
            result,
            Err(ReservationError::DateConflict { date }) if date == self::date("2020-03-07")
        ));
        // the losing request must leave no trace
        assert_eq!(store.len().await, 1);
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE - 3);
    }

    #[tokio::test]
    async fn concurrent_overlapping_creates_admit_exactly_one() {
        let (engine, store) = engine_at("2020-03-01");

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { create(&engine, "2020-03-05", "2020-03-08").await })
        };
        let second = {
            let engine = engine.clone();
            tokio::spawn(async move { create(&engine, "2020-03-05", "2020-03-08").await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|result| result.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|result| matches!(result, Err(ReservationError::DateConflict { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_disjoint_creates_both_succeed() {
        let (engine, store) = engine_at("2020-03-01");

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { create(&engine, "2020-03-05", "2020-03-08").await })
        };
        let second = {
            let engine = engine.clone();
            tokio::spawn(async move { create(&engine, "2020-03-10", "2020-03-11").await })
        };

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn create_at_the_window_edge_clips_the_spilling_nights() {
        let (engine, _) = engine_at("2020-03-01");

        // check-in on the last bookable day; two of the three nights fall
        // past the horizon and are not tracked
        create(&engine, "2020-04-01", "2020-04-04").await.unwrap();

        let available = engine.available_dates(31);
        assert_eq!(available.len(), WINDOW_SIZE - 1);
        assert!(!available.contains(&date("2020-04-01")));
    }

    #[tokio::test]
    async fn zero_night_stay_is_persisted_but_occupies_nothing() {
        let (engine, store) = engine_at("2020-03-01");

        let id = create(&engine, "2020-03-05", "2020-03-05").await.unwrap();

        assert!(store.find_by_id(&id).await.unwrap().is_some());
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE);
    }

    #[tokio::test]
    async fn modify_with_no_effective_change_returns_the_reservation_as_is() {
        let (engine, _) = engine_at("2020-03-01");
        let id = create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        let unchanged = engine
            .modify_reservation(&id, &ReservationUpdate::default())
            .await
            .unwrap();

        assert_eq!(unchanged.id, id);
        assert_eq!(unchanged.check_in, date("2020-03-05"));
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE - 3);
    }

    #[tokio::test]
    async fn modify_moves_the_occupied_days() {
        let (engine, store) = engine_at("2020-03-01");
        let id = create(&engine, "2020-03-03", "2020-03-05").await.unwrap();

        let updated = engine
            .modify_reservation(
                &id,
                &ReservationUpdate {
                    check_in: Some(date("2020-03-10")),
                    check_out: Some(date("2020-03-12")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.check_in, date("2020-03-10"));
        let available = engine.available_dates(31);
        assert!(available.contains(&date("2020-03-03")));
        assert!(available.contains(&date("2020-03-04")));
        assert!(!available.contains(&date("2020-03-10")));
        assert!(!available.contains(&date("2020-03-11")));

        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.check_out, date("2020-03-12"));
    }

    #[tokio::test]
    async fn modify_may_shift_into_its_own_current_days() {
        let (engine, _) = engine_at("2020-03-01");
        let id = create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        engine
            .modify_reservation(
                &id,
                &ReservationUpdate {
                    check_in: Some(date("2020-03-06")),
                    check_out: Some(date("2020-03-09")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let available = engine.available_dates(31);
        assert!(available.contains(&date("2020-03-05")));
        assert!(!available.contains(&date("2020-03-06")));
        assert!(!available.contains(&date("2020-03-07")));
        assert!(!available.contains(&date("2020-03-08")));
    }

    #[tokio::test]
    async fn modify_conflict_leaves_both_reservations_untouched() {
        let (engine, store) = engine_at("2020-03-01");
        let first = create(&engine, "2020-03-03", "2020-03-05").await.unwrap();
        create(&engine, "2020-03-06", "2020-03-08").await.unwrap();

        let result = engine
            .modify_reservation(
                &first,
                &ReservationUpdate {
                    check_in: Some(date("2020-03-05")),
                    check_out: Some(date("2020-03-08")),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(ReservationError::DateConflict { date }) if date == self::date("2020-03-06")
        ));

        // the failed modify must not have freed or moved anything
        let available = engine.available_dates(31);
        assert!(!available.contains(&date("2020-03-03")));
        assert!(!available.contains(&date("2020-03-04")));
        assert!(available.contains(&date("2020-03-05")));
        let stored = store.find_by_id(&first).await.unwrap().unwrap();
        assert_eq!(stored.check_in, date("2020-03-03"));
    }

    #[tokio::test]
    async fn modify_validates_the_merged_reservation() {
        let (engine, _) = engine_at("2020-03-01");
        let id = create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        let result = engine
            .modify_reservation(
                &id,
                &ReservationUpdate {
                    check_out: Some(date("2020-03-10")),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ReservationError::StayTooLong)));
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE - 3);
    }

    #[tokio::test]
    async fn modify_unknown_id_is_not_found() {
        let (engine, _) = engine_at("2020-03-01");
        let result = engine
            .modify_reservation("missing", &ReservationUpdate::default())
            .await;
        assert!(matches!(result, Err(ReservationError::NotFound)));
    }

    #[tokio::test]
    async fn cancel_frees_the_days_and_flags_the_reservation() {
        let (engine, store) = engine_at("2020-03-01");
        let id = create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        let cancelled = engine.cancel_reservation(&id).await.unwrap();

        assert!(cancelled.cancelled);
        assert_eq!(cancelled.check_in, date("2020-03-05"));
        assert_eq!(cancelled.check_out, date("2020-03-08"));
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE);

        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert!(stored.cancelled);
        assert_eq!(stored.check_in, date("2020-03-05"));
    }

    #[tokio::test]
    async fn cancel_unknown_id_is_not_found() {
        let (engine, _) = engine_at("2020-03-01");
        let result = engine.cancel_reservation("missing").await;
        assert!(matches!(result, Err(ReservationError::NotFound)));
    }

    #[tokio::test]
    async fn cancelling_twice_does_not_free_a_rebooked_stay() {
        let (engine, _) = engine_at("2020-03-01");
        let first = create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        engine.cancel_reservation(&first).await.unwrap();
        create(&engine, "2020-03-05", "2020-03-08").await.unwrap();

        let again = engine.cancel_reservation(&first).await.unwrap();
        assert!(again.cancelled);
        // the second holder's days stay reserved
        assert_eq!(engine.available_dates(31).len(), WINDOW_SIZE - 3);
    }

    #[tokio::test]
    async fn roll_window_shifts_occupancy_by_one_day() {
        let (engine, _) = engine_at("2020-03-01");
        create(&engine, "2020-03-02", "2020-03-03").await.unwrap();
        create(&engine, "2020-03-05", "2020-03-06").await.unwrap();

        let before = engine.calendar.snapshot();
        engine.roll_window().await.unwrap();
        let after = engine.calendar.snapshot();

        for index in 0..WINDOW_SIZE - 1 {
            assert_eq!(after[index], before[index + 1], "index {index}");
        }
        assert!(!after[WINDOW_SIZE - 1]);
    }

    #[tokio::test]
    async fn rebuild_from_store_reproduces_availability() {
        let (engine, store) = engine_at("2020-03-01");
        create(&engine, "2020-03-03", "2020-03-05").await.unwrap();
        create(&engine, "2020-03-10", "2020-03-13").await.unwrap();
        let cancelled = create(&engine, "2020-03-20", "2020-03-22").await.unwrap();
        engine.cancel_reservation(&cancelled).await.unwrap();
        let before_restart = engine.available_dates(31);

        // simulated restart: fresh engine over the same store
        let clock = Arc::new(FixedClock::new(date("2020-03-01")));
        let restarted = ReservationEngine::new(store.clone(), clock, None);
        restarted.rebuild_from_store().await.unwrap();

        assert_eq!(restarted.available_dates(31), before_restart);
    }

    /// Store whose `save` blocks until released, to keep an engine operation
    /// holding its day locks.
    struct BlockingStore {
        inner: MemoryReservationStore,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl ReservationStore for BlockingStore {
        async fn save(&self, reservation: &Reservation) -> Result<Reservation, StoreError> {
            self.release.notified().await;
            self.inner.save(reservation).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_check_in_on_or_after(
            &self,
            date: NaiveDate,
        ) -> Result<Vec<Reservation>, StoreError> {
            self.inner.find_by_check_in_on_or_after(date).await
        }
    }

    #[tokio::test]
    async fn contended_overlapping_create_times_out_and_is_retryable() {
        let store = Arc::new(BlockingStore {
            inner: MemoryReservationStore::new(),
            release: Notify::new(),
        });
        let clock = Arc::new(FixedClock::new(date("2020-03-01")));
        let engine = Arc::new(ReservationEngine::new(
            store.clone(),
            clock,
            Some(EngineConfig {
                lock_timeout: Duration::from_millis(50),
            }),
        ));

        // first create parks inside save while holding its day locks
        let holder = {
            let engine = engine.clone();
            tokio::spawn(async move { create(&engine, "2020-03-05", "2020-03-08").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let contended = create(&engine, "2020-03-07", "2020-03-10").await;
        assert!(matches!(contended, Err(ReservationError::LockTimeout)));

        // release the holder; its create completes normally
        store.release.notify_one();
        assert!(holder.await.unwrap().is_ok());

        // with the locks free again the retry reaches the conflict check
        let retry = create(&engine, "2020-03-07", "2020-03-10").await;
        assert!(matches!(retry, Err(ReservationError::DateConflict { .. })));
    }
}
