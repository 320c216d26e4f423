//! Bounded command history with a wrapping navigation cursor.

use std::collections::VecDeque;

/// Default number of retained lines.
pub const DEFAULT_CAPACITY: usize = 10;

/// Submitted lines, oldest first.
///
/// The cursor counts back from the most recent entry (0 = newest) and wraps
/// in both directions. Recording a line resets it.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    cursor: usize,
}

impl History {
    /// Create a history holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Append a line unless it repeats the most recent one.
    pub fn record(&mut self, line: &str) {
        if self.entries.back().is_none_or(|last| last != line) {
            self.entries.push_back(line.to_string());
            if self.entries.len() > self.capacity {
                self.entries.pop_front();
            }
        }
        self.reset_cursor();
    }

    /// Entry under the cursor, then step towards older entries.
    ///
    /// Wraps back to the newest entry after the oldest. Returns an empty
    /// string on an empty history.
    pub fn back(&mut self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let line = self.current();
        self.cursor += 1;
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
        line
    }

    /// Entry under the cursor, then step towards newer entries.
    ///
    /// Wraps to the oldest entry when stepping past the newest.
    pub fn forward(&mut self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let line = self.current();
        self.cursor = match self.cursor {
            0 => self.entries.len() - 1,
            n => n - 1,
        };
        line
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored lines, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    fn current(&self) -> String {
        let len = self.entries.len();
        let index = len - 1 - (self.cursor % len);
        self.entries[index].clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
