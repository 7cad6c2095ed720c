//! Delayed actions measured in simulation time.
//!
//! Timers advance only when the session is updated, so a paused game
//! pauses its pending jailbreaks and message expiries too.

use std::time::Duration;

/// A queue of actions that come due after a delay.
#[derive(Debug, Clone)]
pub struct Timers<A> {
    pending: Vec<Pending<A>>,
}

#[derive(Debug, Clone)]
struct Pending<A> {
    remaining: Duration,
    action: A,
}

impl<A> Timers<A> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Schedules `action` to come due after `delay`.
    pub fn schedule(&mut self, delay: Duration, action: A) {
        self.pending.push(Pending {
            remaining: delay,
            action,
        });
    }

    /// Advances every timer by `dt` and returns the actions that came due,
    /// in the order they were scheduled.
    pub fn advance(&mut self, dt: Duration) -> Vec<A> {
        let mut due = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for mut p in self.pending.drain(..) {
            match p.remaining.checked_sub(dt) {
                Some(left) if !left.is_zero() => {
                    p.remaining = left;
                    still_pending.push(p);
                }
                _ => due.push(p.action),
            }
        }
        self.pending = still_pending;
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<A> Default for Timers<A> {
    fn default() -> Self {
        Self::new()
    }
}
