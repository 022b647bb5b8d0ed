//! Stale-response protection for views.
//!
//! A view may issue a new fetch before an earlier one has finished (e.g.,
//! stepping back several days on the attendance sheet). Responses can come
//! back in any order, so each fetch takes a ticket and only the response to
//! the latest ticket is applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A monotonically increasing sequence of request tickets.
#[derive(Debug, Clone, Default)]
pub struct RequestSequence(Arc<AtomicU64>);

/// The ticket of an issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// The latest state of a view.
#[derive(Debug)]
pub struct ViewState<T> {
    sequence: RequestSequence,
    current: Option<T>,

    /// The ticket `current` was fetched with.
    applied: Option<Ticket>,
}

impl RequestSequence {
    /// Issues a ticket newer than every ticket issued before.
    pub fn issue(&self) -> Ticket {
        Ticket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns whether no newer ticket has been issued.
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest() == ticket
    }

    fn latest(&self) -> Ticket {
        Ticket(self.0.load(Ordering::SeqCst))
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self {
            sequence: RequestSequence::default(),
            current: None,
            applied: None,
        }
    }

    /// Starts a fetch for the view.
    pub fn begin(&self) -> Ticket {
        self.sequence.issue()
    }

    /// Returns whether the latest fetch hasn't been applied yet.
    pub fn is_loading(&self) -> bool {
        self.applied.unwrap_or(Ticket(0)) != self.sequence.latest()
    }

    /// Applies the response to a fetch, unless a newer one was started.
    ///
    /// Returns whether the response was applied.
    pub fn apply(&mut self, ticket: Ticket, value: T) -> bool {
        if self.sequence.is_latest(ticket) {
            self.current = Some(value);
            self.applied = Some(ticket);
            true
        } else {
            tracing::debug!("Dropping stale response {:?}", ticket);
            false
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.current.as_mut()
    }
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_increase() {
        let sequence = RequestSequence::default();
        let a = sequence.issue();
        let b = sequence.issue();

        assert!(b > a);
        assert!(!sequence.is_latest(a));
        assert!(sequence.is_latest(b));

        let shared = sequence.clone();
        let c = shared.issue();
        assert!(!sequence.is_latest(b));
        assert!(sequence.is_latest(c));
    }

    #[test]
    fn test_out_of_order_responses() {
        let mut view = ViewState::new();

        let older = view.begin();
        let newer = view.begin();

        assert!(view.apply(newer, "newer"));
        assert!(!view.apply(older, "older"));
        assert_eq!(Some(&"newer"), view.get());
    }

    #[test]
    fn test_in_order_responses() {
        let mut view = ViewState::new();
        assert!(view.get().is_none());
        assert!(!view.is_loading());

        let first = view.begin();
        assert!(view.is_loading());
        assert!(view.apply(first, 1));

        let second = view.begin();
        assert!(view.is_loading());
        assert_eq!(Some(&1), view.get());
        assert!(view.apply(second, 2));
        assert!(!view.is_loading());
        assert_eq!(Some(&2), view.get());
    }

    #[tokio::test]
    async fn test_concurrent_fetches() {
        use std::time::Duration;
        use tokio::sync::mpsc;

        let mut view = ViewState::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // The first fetch is the slowest, so it finishes last.
        for (value, delay) in [(1u32, 30u64), (2, 10), (3, 20)] {
            let ticket = view.begin();
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                tx.send((ticket, value)).unwrap();
            });
        }
        drop(tx);

        let mut applied = Vec::new();
        while let Some((ticket, value)) = rx.recv().await {
            if view.apply(ticket, value) {
                applied.push(value);
            }
        }

        assert_eq!(vec![3], applied);
        assert_eq!(Some(&3), view.get());
    }
}
