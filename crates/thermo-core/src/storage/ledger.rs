extern crate alloc;
use alloc::string::String;

use heapless::Deque;

/// Number of failed payloads retained before a combined fallback send
pub const LEDGER_CAPACITY: usize = 10;

/// Result of recording a payload in the [`FailureLedger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionOutcome {
    /// There was room; nothing was lost
    Accepted,
    /// The ledger was full; the oldest payload was evicted to make room
    Replaced { evicted: String },
}

/// Bounded, insertion-ordered buffer of report payloads that failed delivery
///
/// Under a sustained outage the ledger keeps the freshest `N` payloads: once
/// full, every new payload evicts the oldest one. It is owned by the
/// reporter alone and needs no locking.
#[derive(Debug)]
pub struct FailureLedger<const N: usize = LEDGER_CAPACITY> {
    entries: Deque<String, N>,
}

impl<const N: usize> FailureLedger<N> {
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Append a payload, evicting the oldest one if the ledger is full
    pub fn record(&mut self, payload: String) -> InsertionOutcome {
        let evicted = if self.entries.is_full() {
            self.entries.pop_front()
        } else {
            None
        };

        // Room is guaranteed: the ledger was not full or the oldest entry was just popped
        let _ = self.entries.push_back(payload);

        match evicted {
            Some(evicted) => InsertionOutcome::Replaced { evicted },
            None => InsertionOutcome::Accepted,
        }
    }

    /// Join every held payload into one newline-terminated blob, oldest
    /// first, and empty the ledger
    pub fn drain_combined(&mut self) -> String {
        let total: usize = self.entries.iter().map(|entry| entry.len() + 1).sum();
        let mut blob = String::with_capacity(total);
        while let Some(entry) = self.entries.pop_front() {
            blob.push_str(&entry);
            blob.push('\n');
        }
        blob
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Held payloads, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }
}

impl<const N: usize> Default for FailureLedger<N> {
    fn default() -> Self {
        Self::new()
    }
}
