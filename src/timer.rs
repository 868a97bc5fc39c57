//! Cooperative timer source (spec §5, SPEC_FULL.md §C.3).
//!
//! Ported from the original's `timer.c` register/cancel/poll-expired
//! abstraction: a central time source is polled once per [`crate::core::Core::tick`],
//! and expired timers fire in registration order (spec §5). There is no
//! wall-clock dependency here — callers advance time explicitly by handing
//! in the elapsed `Duration` each tick, which keeps this deterministic and
//! testable without sleeping.

use std::time::Duration;

/// Stable handle to a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

struct Entry {
    id: TimerId,
    remaining: Duration,
    payload: u64,
    active: bool,
}

/// Registration-ordered timer wheel. `payload` is an opaque tag (typically
/// a `TransactionId`'s raw index combined with a timer-kind discriminant)
/// the owning FSM uses to know which timer fired.
#[derive(Default)]
pub struct TimerWheel {
    entries: Vec<Entry>,
    next_index: usize,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new timer, due after `duration` elapses. Registration
    /// order among co-expiring timers is preserved (spec §5).
    pub fn register(&mut self, duration: Duration, payload: u64) -> TimerId {
        let id = TimerId(self.next_index);
        self.next_index += 1;
        self.entries.push(Entry { id, remaining: duration, payload, active: true });
        id
    }

    /// Cancel a timer; a no-op if it already fired or was never registered.
    /// Cancelling a transaction-bound timer also clears any pending frame
    /// emission derived from that transaction state (spec §9) — that part
    /// is the owning FSM's responsibility once it sees the timer is gone.
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.active = false;
        }
    }

    /// Cancel every timer whose payload matches `payload` (used when a
    /// transceiver or transaction is destroyed and must cancel all of its
    /// timers, spec §5).
    pub fn cancel_all_with_payload(&mut self, payload: u64) {
        for entry in self.entries.iter_mut() {
            if entry.payload == payload {
                entry.active = false;
            }
        }
    }

    /// Advance time by `elapsed`, returning the payloads of every timer that
    /// expired this tick, in registration order.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<u64> {
        let mut fired = Vec::new();
        for entry in self.entries.iter_mut() {
            if !entry.active {
                continue;
            }
            entry.remaining = entry.remaining.saturating_sub(elapsed);
            if entry.remaining.is_zero() {
                entry.active = false;
                fired.push(entry.payload);
            }
        }
        self.entries.retain(|e| e.active);
        fired
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id && e.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_after_elapsed_duration() {
        let mut wheel = TimerWheel::new();
        wheel.register(Duration::from_millis(500), 1);
        assert!(wheel.tick(Duration::from_millis(400)).is_empty());
        assert_eq!(wheel.tick(Duration::from_millis(200)), vec![1]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut wheel = TimerWheel::new();
        let id = wheel.register(Duration::from_millis(100), 7);
        wheel.cancel(id);
        assert!(wheel.tick(Duration::from_millis(200)).is_empty());
        assert!(!wheel.is_active(id));
    }

    #[test]
    fn co_expiring_timers_fire_in_registration_order() {
        let mut wheel = TimerWheel::new();
        wheel.register(Duration::from_millis(100), 1);
        wheel.register(Duration::from_millis(100), 2);
        wheel.register(Duration::from_millis(100), 3);
        assert_eq!(wheel.tick(Duration::from_millis(100)), vec![1, 2, 3]);
    }

    #[test]
    fn cancel_all_with_payload_clears_every_matching_timer() {
        let mut wheel = TimerWheel::new();
        wheel.register(Duration::from_millis(100), 42);
        wheel.register(Duration::from_millis(100), 42);
        wheel.register(Duration::from_millis(100), 99);
        wheel.cancel_all_with_payload(42);
        assert_eq!(wheel.tick(Duration::from_millis(100)), vec![99]);
    }
}
