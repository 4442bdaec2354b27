//! Simulation clock and deferred continuations
//!
//! Nothing in the simulation blocks. Reload durations, burst gaps and the
//! death grace period are entries in a `TimerQueue`, popped by the driver
//! once the clock has passed their due time.

use crate::core::types::{EntityId, Seconds, WeaponId};
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Monotonic simulation clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    now: Seconds,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Seconds {
        self.now
    }

    /// Advance by `dt`; negative or NaN deltas are ignored
    pub fn advance(&mut self, dt: Seconds) -> Seconds {
        if dt > 0.0 {
            self.now += dt;
        }
        self.now
    }
}

/// Work the driver runs once its due time has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ReloadComplete(WeaponId),
    BurstShot(WeaponId),
    /// End of the death grace period
    RemoveEntity(EntityId),
}

/// Handle returned by `TimerQueue::schedule`, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Min-heap of payloads keyed on due time
///
/// Entries due at the same instant pop in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(OrderedFloat<Seconds>, TimerId)>>,
    payloads: AHashMap<TimerId, T>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            payloads: AHashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Seconds, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((OrderedFloat(due), id)));
        self.payloads.insert(id, payload);
        id
    }

    /// Cancel a pending entry, returning its payload if it had not fired
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        // The heap entry stays behind and is skipped when popped
        self.payloads.remove(&id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.payloads.contains_key(&id)
    }

    /// Pop the earliest entry due at or before `now`
    pub fn pop_due(&mut self, now: Seconds) -> Option<(Seconds, T)> {
        while let Some(Reverse((due, id))) = self.heap.peek().copied() {
            if due.0 > now {
                return None;
            }
            self.heap.pop();
            if let Some(payload) = self.payloads.remove(&id) {
                return Some((due.0, payload));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ignores_negative_delta() {
        let mut clock = SimClock::new();
        clock.advance(0.5);
        clock.advance(-1.0);
        clock.advance(f64::NAN);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn test_timers_pop_in_due_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(2.0, "late");
        timers.schedule(1.0, "early");
        timers.schedule(1.0, "early-second");

        assert_eq!(timers.pop_due(0.5), None);
        assert_eq!(timers.pop_due(1.0), Some((1.0, "early")));
        assert_eq!(timers.pop_due(1.0), Some((1.0, "early-second")));
        assert_eq!(timers.pop_due(1.5), None);
        assert_eq!(timers.pop_due(5.0), Some((2.0, "late")));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(1.0, 1);
        timers.schedule(1.0, 2);

        assert_eq!(timers.cancel(id), Some(1));
        assert!(!timers.is_pending(id));
        assert_eq!(timers.pop_due(10.0), Some((1.0, 2)));
        assert_eq!(timers.pop_due(10.0), None);
    }
}
