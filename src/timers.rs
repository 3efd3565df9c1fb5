use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle to a scheduled action, used to cancel it before it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Virtual-time queue of delayed actions.
///
/// Owners feed real elapsed time through `advance` on every runtime tick; tests
/// feed it directly. Actions fire in deadline order, ties in scheduling order.
#[derive(Debug)]
pub struct Timers<T> {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Virtual time elapsed since this queue was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, action: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    /// Returns true if the timer was still pending
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.pending.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }

    /// Moves virtual time forward and returns every action whose deadline passed
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let mut fired = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            let (deadline, id) = *entry.key();
            if deadline > self.now {
                break;
            }
            fired.push(entry.remove());
            self.deadlines.remove(&id);
        }
        fired
    }
}
