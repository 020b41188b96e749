//! Cancellable delayed actions on a virtual clock.
//!
//! The registry never runs anything itself. Owners schedule an action value,
//! keep the returned handle, and drain due actions with [`TimerRegistry::pop_due`]
//! one at a time, so a cancellation made while handling one action is honored
//! for every action after it, including ones due in the same tick.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Opaque reference to a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// An action whose deadline has been reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<A> {
    pub handle: TimerHandle,
    pub deadline: Duration,
    pub action: A,
}

/// Registry of delayed actions keyed by deadline
#[derive(Debug)]
pub struct TimerRegistry<A> {
    /// Current virtual time
    now: Duration,

    /// Next handle id; doubles as a tie-breaker so equal deadlines fire in scheduling order
    next_id: u64,

    /// Scheduled actions ordered by (deadline, id)
    queue: BTreeMap<(Duration, u64), A>,

    /// Handle id -> deadline for live entries
    deadlines: HashMap<u64, Duration>,
}

impl<A> TimerRegistry<A> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `action` to become due after `delay`
    pub fn schedule(&mut self, delay: Duration, action: A) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;

        let deadline = self.now + delay;
        self.queue.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);

        TimerHandle(id)
    }

    /// Cancel a scheduled action. Returns false if it already fired or was canceled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => {
                self.queue.remove(&(deadline, handle.0));
                true
            }
            None => false,
        }
    }

    /// Cancel every handle in `handles`, leaving it empty
    pub fn cancel_all(&mut self, handles: &mut Vec<TimerHandle>) {
        for handle in handles.drain(..) {
            self.cancel(handle);
        }
    }

    /// Whether `handle` is still waiting to fire
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Deadline of the earliest scheduled action
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of scheduled actions
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return the earliest action due at or before `until`.
    ///
    /// The clock moves to that action's deadline, so anything scheduled while
    /// handling it is timed from the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<A>> {
        let (deadline, id) = *self.queue.keys().next()?;
        if deadline > until {
            return None;
        }

        let action = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        if deadline > self.now {
            self.now = deadline;
        }

        Some(Fired {
            handle: TimerHandle(id),
            deadline,
            action,
        })
    }

    /// Move the clock forward to `to` once everything due has been drained
    pub fn settle_at(&mut self, to: Duration) {
        if to > self.now {
            self.now = to;
        }
    }

    /// Drop every scheduled action
    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            debug!("Dropping {} scheduled timers", self.queue.len());
        }
        self.queue.clear();
        self.deadlines.clear();
    }
}

impl<A> Default for TimerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
