//! Return Address Stack (RAS).
//!
//! Bounded LIFO of return addresses pushed by calls and popped by returns.
//! When full, a push replaces the newest entry so deeper history survives.

/// Bounded return-address stack.
#[derive(Clone, Debug)]
pub struct Ras {
    entries: Vec<u64>,
    capacity: usize,
}

impl Ras {
    /// Creates a stack holding at most `capacity` return addresses.
    /// A zero capacity disables the stack.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no return address is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records the return address of a call.
    pub fn push(&mut self, addr: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop();
        }
        self.entries.push(addr);
    }

    /// Removes and returns the newest return address.
    pub fn pop(&mut self) -> Option<u64> {
        self.entries.pop()
    }

    /// Newest return address, left in place.
    pub fn top(&self) -> Option<u64> {
        self.entries.last().copied()
    }

    /// Discards every entry.
    pub fn flush(&mut self) {
        self.entries.clear();
    }
}
