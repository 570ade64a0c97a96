use std::sync::atomic::{AtomicBool, Ordering};

/// Number of days the availability window covers. Index 0 is tomorrow, so
/// the furthest bookable check-in is `WINDOW_SIZE` days ahead.
pub const WINDOW_SIZE: usize = 31;

/// Rolling occupancy window over the next `WINDOW_SIZE` bookable days.
///
/// Index `i` represents `current date + (i + 1)` days; a `true` entry means
/// the campsite is reserved for that day. Index 0 never represents the
/// current day, as same-day booking is disallowed.
///
/// The window is derived state: it can be rebuilt at any time from the
/// reservations held in the durable store. Entries are atomics so that
/// availability queries can read the live window without taking any lock;
/// every write happens under a held range lock, which provides the ordering
/// writers need between themselves, so all accesses here are relaxed.
pub struct CalendarWindow {
    days: Vec<AtomicBool>,
}

impl CalendarWindow {
    /// Creates a window of `WINDOW_SIZE` unoccupied days.
    pub fn new() -> Self {
        Self {
            days: (0..WINDOW_SIZE).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Number of days in the window. Always `WINDOW_SIZE`.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True when no day in the window is occupied.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|day| !day.load(Ordering::Relaxed))
    }

    /// Returns whether the day at `index` is occupied.
    pub fn is_occupied(&self, index: usize) -> bool {
        self.days[index].load(Ordering::Relaxed)
    }

    /// Sets every day in `start..=end` to the given occupancy.
    pub fn set_range(&self, start: usize, end: usize, occupied: bool) {
        for day in &self.days[start..=end] {
            day.store(occupied, Ordering::Relaxed);
        }
    }

    /// Shifts the window forward by one day: the entry at `i + 1` moves to
    /// `i`, and the vacated final entry is cleared to unoccupied. Must run
    /// with every day lock held, as it touches the whole window.
    pub fn rotate_forward(&self) {
        for index in 0..self.days.len() - 1 {
            let next = self.days[index + 1].load(Ordering::Relaxed);
            self.days[index].store(next, Ordering::Relaxed);
        }
        self.days[self.days.len() - 1].store(false, Ordering::Relaxed);
    }

    /// Returns a copy of the window for read-only inspection.
    pub fn snapshot(&self) -> Vec<bool> {
        self.days
            .iter()
            .map(|day| day.load(Ordering::Relaxed))
            .collect()
    }

    /// Clears every day to unoccupied.
    pub fn reset(&self) {
        for day in &self.days {
            day.store(false, Ordering::Relaxed);
        }
    }
}
