//! Virtual-clock timer slots
//!
//! One slot per [`TimerKind`]. Arming a kind replaces whatever that slot held,
//! so at most three timers are ever pending. The clock only moves when told
//! to, which makes every test and replay exact.

use blockfall_core::{Timer, TimerKind, TimerRequest, TimerToken};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    token: TimerToken,
    due_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    slots: [Option<Slot>; 3],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the scheduler was created.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Apply arm/cancel requests in order.
    pub fn apply(&mut self, requests: &[TimerRequest]) {
        for request in requests {
            match *request {
                TimerRequest::Arm {
                    kind,
                    token,
                    after_ms,
                } => {
                    trace!(?kind, after_ms, "arm");
                    self.slots[kind.index()] = Some(Slot {
                        token,
                        due_ms: self.now_ms + after_ms as u64,
                    });
                }
                TimerRequest::Cancel(kind) => {
                    self.slots[kind.index()] = None;
                }
            }
        }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, elapsed_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
    }

    /// Remove and return the earliest timer that is due, if any
    ///
    /// Timers due at the same instant come out in [`TimerKind`] order.
    pub fn pop_due(&mut self) -> Option<Timer> {
        let (index, slot) = self.earliest()?;
        if slot.due_ms > self.now_ms {
            return None;
        }
        self.slots[index] = None;
        Some(Timer {
            kind: TimerKind::ALL[index],
            token: slot.token,
        })
    }

    /// Absolute time of the earliest pending timer.
    pub fn next_due_at(&self) -> Option<u64> {
        self.earliest().map(|(_, slot)| slot.due_ms)
    }

    /// Milliseconds until the earliest pending timer; zero when one is already due.
    pub fn next_due_in(&self) -> Option<u64> {
        self.next_due_at()
            .map(|due| due.saturating_sub(self.now_ms))
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.slots = [None; 3];
    }

    fn earliest(&self) -> Option<(usize, Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .min_by_key(|&(i, s)| (s.due_ms, i))
    }
}
