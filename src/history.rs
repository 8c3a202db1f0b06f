//! Append-only record of executed submissions.

use chrono::{DateTime, Local};
use regex::Regex;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

/// Number of entries `/history` shows by default.
pub const DEFAULT_TAIL: usize = 25;

/// Handle shared between the session and the script namespace.
pub type SharedHistory = Rc<RefCell<HistoryLog>>;

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}:\d{2}:\d{2})\] (.*?): (.*)$").expect("history line pattern is valid")
});

/// One executed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Participant the submission is attributed to; may be the anonymous placeholder.
    pub author: String,
    /// Raw submitted text.
    pub code: String,
    pub timestamp: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(author: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            code: code.into(),
            timestamp: Local::now(),
        }
    }

    /// Wall clock time of the entry as `HH:MM:SS`.
    pub fn time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.time(), self.author, self.code)
    }
}

/// Chronological log of submissions. Entries are never modified or reordered;
/// the only way to drop them is [`HistoryLog::clear`] during a full reset.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log behind a shared handle.
    pub fn shared() -> SharedHistory {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Append a submission stamped with the current local time.
    pub fn record(&mut self, author: impl Into<String>, code: impl Into<String>) {
        self.push(HistoryEntry::new(author, code));
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// The most recent `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every entry as `[HH:MM:SS] author: code`, one per line.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Read back the output of [`HistoryLog::serialize`] as `(author, code)` pairs.
    ///
    /// The author ends at the first `": "`. Lines that do not look like log
    /// entries are skipped.
    pub fn parse(text: &str) -> Vec<(String, String)> {
        text.lines()
            .filter_map(|line| ENTRY_LINE.captures(line))
            .map(|caps| (caps[2].to_string(), caps[3].to_string()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
