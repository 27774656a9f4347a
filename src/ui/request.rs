use std::collections::HashMap;

/// A logical resource a view fetches. Results for the same slot race; only
/// the newest request may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Catalog,
    Manga,
    Genres,
    Metadata,
    Chapters,
    ChapterList,
    GenreListing,
    Reader,
    PageImage,
    Cover,
    DetailCover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub generation: u64,
}

/// Hands out request-generation tokens and tells stale results apart.
#[derive(Debug, Default)]
pub struct RequestTracker {
    next: u64,
    latest: HashMap<Slot, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request for `slot`, superseding any in flight.
    pub fn issue(&mut self, slot: Slot) -> Ticket {
        self.next += 1;
        self.latest.insert(slot, self.next);
        Ticket {
            slot,
            generation: self.next,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.get(&ticket.slot) == Some(&ticket.generation)
    }

    /// Drops interest in whatever is in flight for these slots.
    pub fn invalidate(&mut self, slots: &[Slot]) {
        for slot in slots {
            self.latest.remove(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_wins() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue(Slot::Catalog);
        let second = tracker.issue(Slot::Catalog);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn test_slots_are_independent() {
        let mut tracker = RequestTracker::new();
        let catalog = tracker.issue(Slot::Catalog);
        let manga = tracker.issue(Slot::Manga);
        tracker.issue(Slot::Manga);
        assert!(tracker.is_current(catalog));
        assert!(!tracker.is_current(manga));
    }

    #[test]
    fn test_invalidate_cancels_interest() {
        let mut tracker = RequestTracker::new();
        let pages = tracker.issue(Slot::Reader);
        tracker.invalidate(&[Slot::Reader, Slot::PageImage]);
        assert!(!tracker.is_current(pages));

        let again = tracker.issue(Slot::Reader);
        assert_ne!(pages.generation, again.generation);
        assert!(tracker.is_current(again));
        assert!(!tracker.is_current(pages));
    }
}
