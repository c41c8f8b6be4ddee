//! Lifecycle metadata for pooled objects

use std::panic::Location;
use std::time::{Duration, Instant};

/// Where a pooled object is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Sitting in the idle registry
    Idle,

    /// Taken from the idle registry (or just created) and being
    /// activated/validated for a borrower
    Allocated,

    /// Lent to a borrower
    Active,

    /// Destroyed because it failed validation or was invalidated
    Invalid,

    /// Destroyed by the eviction sweep
    Evicted,

    /// Reclaimed from a borrower that held it too long
    Abandoned,
}

/// Snapshot of one tracked object's lifecycle data
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub id: u64,
    pub state: EntryState,
    pub created_at: Instant,
    pub last_borrowed_at: Option<Instant>,
    pub last_returned_at: Option<Instant>,
    pub last_used_at: Instant,
    pub borrow_count: u64,
    /// Source location of the most recent borrow
    pub borrowed_from: Option<&'static Location<'static>>,
}

impl EntryInfo {
    pub(crate) fn new(id: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: EntryState::Idle,
            created_at: now,
            last_borrowed_at: None,
            last_returned_at: None,
            last_used_at: now,
            borrow_count: 0,
            borrowed_from: None,
        }
    }

    pub(crate) fn mark_borrowed(&mut self, location: &'static Location<'static>) {
        let now = Instant::now();
        self.state = EntryState::Active;
        self.last_borrowed_at = Some(now);
        self.last_used_at = now;
        self.borrow_count += 1;
        self.borrowed_from = Some(location);
    }

    pub(crate) fn mark_returned(&mut self) {
        let now = Instant::now();
        self.state = EntryState::Idle;
        self.last_returned_at = Some(now);
        self.last_used_at = now;
    }

    pub(crate) fn touch(&mut self) {
        self.last_used_at = Instant::now();
    }

    /// Time spent in the idle registry since the last return (or creation).
    pub fn idle_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_returned_at.unwrap_or(self.created_at))
    }

    /// Time since the borrower last used the object.
    pub fn unused_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_used_at)
    }

    /// Time since the object was created.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

/// An idle object together with its metadata
pub(crate) struct PooledEntry<T> {
    pub info: EntryInfo,
    pub payload: T,
}

impl<T> PooledEntry<T> {
    pub fn new(id: u64, payload: T) -> Self {
        Self {
            info: EntryInfo::new(id),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_and_return_stamps() {
        let mut info = EntryInfo::new(7);
        assert_eq!(info.state, EntryState::Idle);
        assert_eq!(info.borrow_count, 0);

        info.mark_borrowed(Location::caller());
        assert_eq!(info.state, EntryState::Active);
        assert_eq!(info.borrow_count, 1);
        assert!(info.last_borrowed_at.is_some());
        assert!(info.borrowed_from.is_some());

        info.mark_returned();
        assert_eq!(info.state, EntryState::Idle);
        assert!(info.last_returned_at.is_some());

        info.mark_borrowed(Location::caller());
        assert_eq!(info.borrow_count, 2);
    }

    #[test]
    fn test_idle_time_measured_from_last_return() {
        let mut info = EntryInfo::new(1);
        let later = info.created_at + Duration::from_secs(10);
        assert_eq!(info.idle_time(later), Duration::from_secs(10));

        info.mark_returned();
        let returned = info.last_returned_at.unwrap();
        assert_eq!(
            info.idle_time(returned + Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }
}
