use std::collections::BTreeMap;

/// Handle to a scheduled wakeup. Orders by due time, then by scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    due_ms: u64,
    seq: u64,
}

impl TimerHandle {
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Set of pending wakeups owned by a run.
///
/// Firing pops from the same set that `clear` empties, so nothing cleared
/// can fire afterwards.
#[derive(Debug, Clone)]
pub struct TimerSet<T> {
    entries: BTreeMap<TimerHandle, T>,
    next_seq: u64,
}

impl<T> Default for TimerSet<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, payload: T) -> TimerHandle {
        let handle = TimerHandle {
            due_ms,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(handle, payload);
        handle
    }

    /// Drop every pending wakeup. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.keys().next().map(|h| h.due_ms)
    }

    /// Remove and return the earliest wakeup if it is due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerHandle, T)> {
        match self.entries.first_key_value() {
            Some((handle, _)) if handle.due_ms <= now_ms => self.entries.pop_first(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
