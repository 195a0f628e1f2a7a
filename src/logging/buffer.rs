//! Size-capped log buffer
//!
//! Pure data structure with no I/O side effects. Insertion order is
//! chronological order; eviction only ever removes from the front.

use super::LogEntry;
use std::collections::VecDeque;
use std::sync::Arc;

/// Ordered, capacity-capped collection of captured entries.
///
/// Uses a ring buffer (`VecDeque`), so both append and eviction are O(1)
/// amortized per entry.
#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl LogBuffer {
    /// Create a new LogBuffer with the given maximum capacity
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
        }
    }

    /// Append an entry, evicting the oldest ones beyond capacity
    ///
    /// Returns how many entries were evicted.
    pub fn append(&mut self, entry: LogEntry) -> usize {
        self.entries.push_back(entry);
        self.enforce_cap()
    }

    /// Replace the contents with previously persisted entries
    ///
    /// Returns how many entries did not fit.
    pub fn restore(&mut self, entries: impl IntoIterator<Item = LogEntry>) -> usize {
        self.entries.clear();
        self.entries.extend(entries);
        self.enforce_cap()
    }

    fn enforce_cap(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess > 0 {
            self.entries.drain(..excess);
        }
        excess
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Independent copy of the current contents
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.entries.iter().cloned().collect(),
        }
    }
}

/// Frozen view of the buffer taken for export or persistence
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Arc<[LogEntry]>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Rendered lines joined with `\n`
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use chrono::Utc;
    use proptest::prelude::*;

    fn entry(text: &str) -> LogEntry {
        LogEntry::new(Utc::now(), LogLevel::Log, text)
    }

    fn texts(buffer: &LogBuffer) -> Vec<String> {
        buffer
            .snapshot()
            .entries()
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    #[test]
    fn test_append_rotates_when_full() {
        let mut buffer = LogBuffer::new(3);
        assert_eq!(buffer.append(entry("1")), 0);
        assert_eq!(buffer.append(entry("2")), 0);
        assert_eq!(buffer.append(entry("3")), 0);
        assert_eq!(buffer.len(), 3);

        assert_eq!(buffer.append(entry("4")), 1);
        assert_eq!(buffer.len(), 3);
        assert_eq!(texts(&buffer), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_restore_keeps_newest() {
        let mut buffer = LogBuffer::new(2);
        let evicted = buffer.restore(vec![entry("a"), entry("b"), entry("c")]);
        assert_eq!(evicted, 1);
        assert_eq!(texts(&buffer), vec!["b", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = LogBuffer::new(10);
        buffer.append(entry("1"));
        buffer.append(entry("2"));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut buffer = LogBuffer::new(10);
        buffer.append(entry("1"));
        let snapshot = buffer.snapshot();

        buffer.append(entry("2"));
        buffer.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entries()[0].text, "1");
    }

    #[test]
    fn test_snapshot_to_text() {
        let mut buffer = LogBuffer::new(10);
        buffer.append(entry("first"));
        buffer.append(LogEntry::new(Utc::now(), LogLevel::Error, "second"));

        let text = buffer.snapshot().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[LOG] first"));
        assert!(lines[1].ends_with("[ERROR] second"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = LogBuffer::new(0);
        buffer.append(entry("only"));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.max_entries(), 1);
    }

    proptest! {
        #[test]
        fn prop_keeps_last_entries_in_order(cap in 1usize..50, extra in 0usize..50) {
            let mut buffer = LogBuffer::new(cap);
            for i in 0..cap + extra {
                buffer.append(entry(&i.to_string()));
                prop_assert!(buffer.len() <= cap);
            }

            let expected: Vec<String> = (extra..cap + extra).map(|i| i.to_string()).collect();
            prop_assert_eq!(texts(&buffer), expected);
        }
    }
}
