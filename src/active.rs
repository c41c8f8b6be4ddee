//! Registry of objects currently lent out

use std::collections::HashMap;
use std::panic::Location;
use std::time::{Duration, Instant};

use crate::entry::{EntryInfo, EntryState};

/// Borrowed (and in-flight allocated) entries keyed by id.
///
/// Payloads live with their borrowers; only metadata is kept here.
#[derive(Default)]
pub(crate) struct ActiveRegistry {
    entries: HashMap<u64, EntryInfo>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Track an entry that is being prepared for a borrower.
    pub fn insert_allocated(&mut self, mut info: EntryInfo) {
        info.state = EntryState::Allocated;
        self.entries.insert(info.id, info);
    }

    /// Finish a borrow. Returns `false` if the entry is no longer tracked.
    pub fn mark_borrowed(&mut self, id: u64, location: &'static Location<'static>) -> bool {
        match self.entries.get_mut(&id) {
            Some(info) => {
                info.mark_borrowed(location);
                true
            }
            None => false,
        }
    }

    pub fn touch(&mut self, id: u64) -> bool {
        match self.entries.get_mut(&id) {
            Some(info) if info.state == EntryState::Active => {
                info.touch();
                true
            }
            _ => false,
        }
    }

    pub fn is_borrowed(&self, id: u64) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|info| info.state == EntryState::Active)
    }

    pub fn remove(&mut self, id: u64) -> Option<EntryInfo> {
        self.entries.remove(&id)
    }

    /// Remove every borrowed entry unused for at least `timeout`, least
    /// recently used first. Entries still being allocated are skipped.
    pub fn take_abandoned(&mut self, timeout: Duration, now: Instant) -> Vec<EntryInfo> {
        let ids: Vec<u64> = self
            .entries
            .values()
            .filter(|info| info.state == EntryState::Active && info.unused_time(now) >= timeout)
            .map(|info| info.id)
            .collect();

        let mut abandoned: Vec<EntryInfo> = ids
            .into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .map(|mut info| {
                info.state = EntryState::Abandoned;
                info
            })
            .collect();
        abandoned.sort_by_key(|info| info.last_used_at);
        abandoned
    }

    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn infos(&self) -> impl Iterator<Item = &EntryInfo> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn borrowed(registry: &mut ActiveRegistry, id: u64) {
        registry.insert_allocated(EntryInfo::new(id));
        assert!(registry.mark_borrowed(id, Location::caller()));
    }

    #[test]
    fn test_allocated_is_not_borrowed() {
        let mut registry = ActiveRegistry::new();
        registry.insert_allocated(EntryInfo::new(1));
        assert!(!registry.is_borrowed(1));
        assert!(!registry.touch(1));

        assert!(registry.mark_borrowed(1, Location::caller()));
        assert!(registry.is_borrowed(1));
        assert!(registry.touch(1));
    }

    #[test]
    fn test_zero_timeout_reclaims_every_borrowed_entry() {
        let mut registry = ActiveRegistry::new();
        borrowed(&mut registry, 1);
        borrowed(&mut registry, 2);
        registry.insert_allocated(EntryInfo::new(3));

        let abandoned = registry.take_abandoned(Duration::ZERO, Instant::now());
        let ids: Vec<u64> = abandoned.iter().map(|info| info.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&1) && ids.contains(&2));
        assert!(abandoned.iter().all(|info| info.state == EntryState::Abandoned));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_long_timeout_reclaims_nothing() {
        let mut registry = ActiveRegistry::new();
        borrowed(&mut registry, 1);

        let abandoned = registry.take_abandoned(Duration::from_secs(5), Instant::now());
        assert!(abandoned.is_empty());
        assert!(registry.is_borrowed(1));
    }

    #[test]
    fn test_unknown_ids() {
        let mut registry = ActiveRegistry::new();
        assert!(!registry.mark_borrowed(9, Location::caller()));
        assert!(registry.remove(9).is_none());
    }
}
