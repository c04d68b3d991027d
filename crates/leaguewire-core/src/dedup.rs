//! Bounded recent-id window for per-process deduplication.
//!
//! Both channels can deliver the same event to one process; callbacks must
//! still fire at most once per id. The window keeps insertion order so the
//! oldest ids age out first once the bound is reached.

use std::collections::{BTreeSet, VecDeque};

use leaguewire_types::EventId;

/// Insertion-ordered set of recently dispatched event ids.
#[derive(Debug)]
pub struct DedupWindow {
    capacity: usize,
    order: VecDeque<EventId>,
    seen: BTreeSet<EventId>,
}

impl DedupWindow {
    /// Create a window holding at most `capacity` ids (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: BTreeSet::new(),
        }
    }

    /// Record an id. Returns `true` when it was not seen before.
    pub fn insert(&mut self, id: EventId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }

    /// Whether an id is currently in the window.
    pub fn contains(&self, id: EventId) -> bool {
        self.seen.contains(&id)
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_of_same_id_is_rejected() {
        let mut window = DedupWindow::new(8);
        let id = EventId::new();
        assert!(window.insert(id));
        assert!(!window.insert(id));
        assert!(window.contains(id));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn oldest_id_ages_out_at_capacity() {
        let mut window = DedupWindow::new(2);
        let first = EventId::new();
        let second = EventId::new();
        let third = EventId::new();

        assert!(window.insert(first));
        assert!(window.insert(second));
        assert!(window.insert(third));

        assert_eq!(window.len(), 2);
        assert!(!window.contains(first));
        assert!(window.contains(second));
        assert!(window.contains(third));
        // An aged-out id is treated as new again.
        assert!(window.insert(first));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut window = DedupWindow::new(0);
        let id = EventId::new();
        assert!(window.insert(id));
        assert!(!window.insert(id));
        assert_eq!(window.len(), 1);
    }
}
