//! Ordered registry of idle objects

use std::collections::VecDeque;

use crate::entry::{EntryInfo, EntryState, PooledEntry};

/// Idle objects, served from the front.
///
/// LIFO pools push returns to the front, so the back holds the object idle
/// the longest. FIFO pools push to the back, so the front is the oldest.
pub(crate) struct IdleRegistry<T> {
    entries: VecDeque<PooledEntry<T>>,
    lifo: bool,
}

impl<T> IdleRegistry<T> {
    pub fn new(lifo: bool, capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            lifo,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, mut entry: PooledEntry<T>) {
        entry.info.state = EntryState::Idle;
        if self.lifo {
            self.entries.push_front(entry);
        } else {
            self.entries.push_back(entry);
        }
    }

    pub fn take(&mut self) -> Option<PooledEntry<T>> {
        self.entries.pop_front()
    }

    /// Examine up to `tests` entries, oldest idle first, removing each one
    /// `evict` accepts. `evict` also receives the idle count at that moment.
    pub fn evict_oldest<P>(&mut self, tests: usize, mut evict: P) -> Vec<PooledEntry<T>>
    where
        P: FnMut(&EntryInfo, usize) -> bool,
    {
        let mut evicted = Vec::new();
        let mut examined = 0;
        let mut cursor = if self.lifo { self.entries.len() } else { 0 };

        while examined < tests {
            if self.lifo {
                if cursor == 0 {
                    break;
                }
                cursor -= 1;
            } else if cursor >= self.entries.len() {
                break;
            }
            examined += 1;

            let idle_count = self.entries.len();
            if evict(&self.entries[cursor].info, idle_count) {
                if let Some(mut entry) = self.entries.remove(cursor) {
                    entry.info.state = EntryState::Evicted;
                    evicted.push(entry);
                }
            } else if !self.lifo {
                cursor += 1;
            }
        }

        evicted
    }

    pub fn drain(&mut self) -> Vec<PooledEntry<T>> {
        self.entries.drain(..).collect()
    }

    pub fn infos(&self) -> impl Iterator<Item = &EntryInfo> {
        self.entries.iter().map(|entry| &entry.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(lifo: bool, ids: &[u64]) -> IdleRegistry<u64> {
        let mut idle = IdleRegistry::new(lifo, ids.len());
        for id in ids {
            idle.push(PooledEntry::new(*id, *id));
        }
        idle
    }

    #[test]
    fn test_lifo_serves_most_recent() {
        let mut idle = registry(true, &[1, 2, 3]);
        assert_eq!(idle.take().map(|e| e.payload), Some(3));
        assert_eq!(idle.len(), 2);
    }

    #[test]
    fn test_fifo_serves_oldest() {
        let mut idle = registry(false, &[1, 2, 3]);
        assert_eq!(idle.take().map(|e| e.payload), Some(1));
    }

    #[test]
    fn test_evict_oldest_respects_test_budget() {
        for lifo in [true, false] {
            let mut idle = registry(lifo, &[1, 2, 3, 4]);
            let evicted = idle.evict_oldest(2, |_, _| true);
            let ids: Vec<u64> = evicted.iter().map(|e| e.payload).collect();
            assert_eq!(ids, vec![1, 2], "lifo = {lifo}");
            assert!(evicted.iter().all(|e| e.info.state == EntryState::Evicted));
            assert_eq!(idle.len(), 2);
        }
    }

    #[test]
    fn test_evict_oldest_skips_rejected() {
        let mut idle = registry(false, &[1, 2, 3]);
        let evicted = idle.evict_oldest(3, |info, _| info.id != 2);
        assert_eq!(evicted.len(), 2);
        assert_eq!(idle.take().map(|e| e.payload), Some(2));
    }

    #[test]
    fn test_evict_passes_shrinking_idle_count() {
        let mut idle = registry(true, &[1, 2, 3]);
        let mut seen = Vec::new();
        idle.evict_oldest(3, |_, count| {
            seen.push(count);
            true
        });
        assert_eq!(seen, vec![3, 2, 1]);
        assert!(idle.is_empty());
    }
}
