//! Request lifecycle guards.
//!
//! [`RequestLifecycle`] decides whether the continuation of an async request may still
//! touch state: the owner must be alive and the request must be the latest one issued.
//! [`InFlightSet`] keeps two operations on the same key from overlapping.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Liveness flag plus a generation counter for one state owner.
#[derive(Debug)]
pub struct RequestLifecycle {
    alive: AtomicBool,
    generation: AtomicU64,
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        }
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// True while the owner is alive and no later ticket has been issued.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.is_alive() && self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Mark the owner dead. Returns `true` only for the call that flipped the flag.
    pub fn dispose(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

/// Set of keys with an operation currently running.
#[derive(Debug, Default, Clone)]
pub struct InFlightSet {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if another operation already holds it.
    ///
    /// The claim is released when the returned guard is dropped.
    pub fn try_acquire(&self, key: &str) -> Option<InFlightGuard> {
        let mut keys = lock(&self.keys);
        if !keys.insert(key.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.keys).contains(key)
    }
}

/// Releases its key from the owning [`InFlightSet`] on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}

// Insert and remove are single operations, so a poisoned set is still consistent.
fn lock(keys: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_is_current() {
        let lifecycle = RequestLifecycle::new();
        let first = lifecycle.begin();
        assert!(lifecycle.is_current(first));

        let second = lifecycle.begin();
        assert!(!lifecycle.is_current(first));
        assert!(lifecycle.is_current(second));
    }

    #[test]
    fn test_dispose_kills_every_ticket() {
        let lifecycle = RequestLifecycle::new();
        let ticket = lifecycle.begin();

        assert!(lifecycle.dispose());
        assert!(!lifecycle.dispose());
        assert!(!lifecycle.is_alive());
        assert!(!lifecycle.is_current(ticket));
        assert!(!lifecycle.is_current(lifecycle.begin()));
    }

    #[test]
    fn test_in_flight_set_rejects_second_claim() {
        let set = InFlightSet::new();
        let guard = set.try_acquire("u1").expect("first claim");
        assert!(set.try_acquire("u1").is_none());
        assert!(set.try_acquire("u2").is_some());
        assert!(set.contains("u1"));

        drop(guard);
        assert!(!set.contains("u1"));
        assert!(set.try_acquire("u1").is_some());
    }
}
