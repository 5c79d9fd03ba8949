use crate::event_log::{EventLog, WordEvent};
use crate::util::{mean, ms_to_minutes, ratio_or_zero};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous run of events, `[start_index, end_index)` into the event log,
/// with metrics derived from that slice the last time it was recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start_index: usize,
    pub end_index: usize,
    /// Characters per minute over the session span
    #[serde(default)]
    pub cpm_avg: f64,
    /// Words per minute over the session span
    #[serde(default)]
    pub wpm_avg: f64,
    #[serde(default)]
    pub swipe_duration_avg: f64,
    #[serde(default)]
    pub time_between_words_avg: f64,
}

impl Session {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
            cpm_avg: 0.0,
            wpm_avg: 0.0,
            swipe_duration_avg: 0.0,
            time_between_words_avg: 0.0,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn events<'a>(&self, log: &'a EventLog) -> &'a [WordEvent] {
        log.slice(self.range())
    }

    /// Rewrites this session's metrics from its current slice of `log`.
    pub fn recompute(&mut self, log: &EventLog) {
        let words = self.events(log);

        let total_chars: usize = words.iter().map(WordEvent::length).sum();
        let minutes = ms_to_minutes(span_ms(words));

        self.cpm_avg = ratio_or_zero(total_chars as f64, minutes);
        self.wpm_avg = ratio_or_zero(words.len() as f64, minutes);

        let durations: Vec<f64> = words.iter().map(|w| w.duration() as f64).collect();
        self.swipe_duration_avg = mean(&durations).unwrap_or(0.0);

        let between: Vec<f64> = gaps(words).map(|g| g as f64).collect();
        self.time_between_words_avg = mean(&between).unwrap_or(0.0);
    }
}

/// Wall-clock span from the first word's start to the last word's end.
pub fn span_ms(words: &[WordEvent]) -> i64 {
    match (words.first(), words.last()) {
        (Some(first), Some(last)) => last.end_time - first.start_time,
        _ => 0,
    }
}

/// Gaps between consecutive words. Overlapping words give negative gaps.
pub fn gaps(words: &[WordEvent]) -> impl Iterator<Item = i64> + '_ {
    words
        .iter()
        .tuple_windows()
        .map(|(previous, current)| current.start_time - previous.end_time)
}
