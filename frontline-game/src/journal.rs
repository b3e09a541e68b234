//! Player-facing combat log.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    #[default]
    Info,
    Danger,
    Good,
}

impl LogKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Danger => "danger",
            Self::Good => "good",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    #[serde(with = "millis")]
    pub timestamp: Duration,
}

/// Capped, most-recent-first buffer. An entry equal in text to the head is
/// dropped.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl LogBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    /// Push a new head entry. Returns it unless suppressed as a duplicate.
    pub fn push(&mut self, text: impl Into<String>, kind: LogKind, timestamp: Duration) -> Option<&LogEntry> {
        let text = text.into();
        if self.entries.front().is_some_and(|head| head.text == text) {
            return None;
        }
        self.next_id += 1;
        self.entries.push_front(LogEntry {
            id: self.next_id,
            text,
            kind,
            timestamp,
        });
        self.entries.truncate(self.capacity);
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn head(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    use crate::numbers::millis_u64;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(millis_u64(value.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
