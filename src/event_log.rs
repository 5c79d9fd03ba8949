use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Latest accepted timestamp, 9999-12-31T23:59:59.999Z in epoch milliseconds
pub const MAX_TIMESTAMP_MS: i64 = 253_402_300_799_999;

/// One completed swipe-entry of a word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEvent {
    pub text: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl WordEvent {
    pub fn new(text: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }

    /// Length in UTF-16 code units, matching how the input surface counts characters.
    pub fn length(&self) -> usize {
        self.text.encode_utf16().count()
    }

    /// Rejects events the aggregators cannot make sense of.
    pub fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(StatsError::InvalidEvent("word text is empty".to_string()));
        }
        for time in [self.start_time, self.end_time] {
            if !(0..=MAX_TIMESTAMP_MS).contains(&time) {
                return Err(StatsError::InvalidEvent(format!(
                    "'{}' has timestamp {} outside 0..={}",
                    self.text, time, MAX_TIMESTAMP_MS
                )));
            }
        }
        if self.end_time < self.start_time {
            return Err(StatsError::InvalidEvent(format!(
                "'{}' ends at {} before it starts at {}",
                self.text, self.end_time, self.start_time
            )));
        }
        Ok(())
    }

    /// Rejects an event that starts before `previous` started.
    pub fn validate_after(&self, previous: &WordEvent) -> Result<()> {
        if self.start_time < previous.start_time {
            return Err(StatsError::InvalidEvent(format!(
                "'{}' starts at {}, before the preceding word '{}' at {}",
                self.text, self.start_time, previous.text, previous.start_time
            )));
        }
        Ok(())
    }
}

/// Append-only, ordered record of every word swiped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<WordEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` and returns its index.
    pub fn append(&mut self, event: WordEvent) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordEvent> {
        self.events.get(index)
    }

    pub fn last(&self) -> Option<&WordEvent> {
        self.events.last()
    }

    /// Events in `range`, clamped to the log bounds.
    pub fn slice(&self, range: Range<usize>) -> &[WordEvent] {
        let end = range.end.min(self.events.len());
        let start = range.start.min(end);
        &self.events[start..end]
    }

    pub fn as_slice(&self) -> &[WordEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordEvent> {
        self.events.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

impl FromIterator<WordEvent> for EventLog {
    fn from_iter<I: IntoIterator<Item = WordEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
