use crate::event_log::{EventLog, WordEvent};
use crate::session::{gaps, span_ms, Session};
use crate::util::{ms_to_minutes, ratio_or_zero};
use serde::{Deserialize, Serialize};

/// Engine-wide averages derived from the whole event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub chars_per_min_avg: f64,
    pub words_per_min_avg: f64,
    pub chars_per_session_avg: f64,
    pub words_per_session_avg: f64,
    pub swipe_duration_avg: f64,
    pub time_between_words_avg: f64,
    /// Characters per minute of the most recent session
    pub cpm_latest_avg: f64,
    /// Words per minute of the most recent session
    pub wpm_latest_avg: f64,
}

/// Recomputes every global average with a full scan of `log` and `sessions`.
///
/// Gaps are only counted inside a session, so the time between the last word
/// of one session and the first word of the next never enters the average.
pub fn recompute_global(log: &EventLog, sessions: &[Session]) -> GlobalStats {
    let total_chars: usize = log.iter().map(WordEvent::length).sum();
    let total_words = log.len();
    let total_swipe_duration: i64 = log.iter().map(WordEvent::duration).sum();

    let mut total_time_between_words: i64 = 0;
    let mut total_session_duration: i64 = 0;
    for session in sessions {
        let words = session.events(log);
        total_time_between_words += gaps(words).sum::<i64>();
        total_session_duration += span_ms(words);
    }

    let session_count = sessions.len();
    let minutes = ms_to_minutes(total_session_duration);
    let intra_session_gaps = total_words.saturating_sub(session_count);

    let time_between_words_avg = if total_words > 1 {
        ratio_or_zero(
            total_time_between_words as f64,
            intra_session_gaps as f64,
        )
    } else {
        0.0
    };

    let latest = sessions.last();

    GlobalStats {
        chars_per_min_avg: ratio_or_zero(total_chars as f64, minutes),
        words_per_min_avg: ratio_or_zero(total_words as f64, minutes),
        chars_per_session_avg: ratio_or_zero(total_chars as f64, session_count as f64),
        words_per_session_avg: ratio_or_zero(total_words as f64, session_count as f64),
        swipe_duration_avg: ratio_or_zero(total_swipe_duration as f64, total_words as f64),
        time_between_words_avg,
        cpm_latest_avg: latest.map_or(0.0, |s| s.cpm_avg),
        wpm_latest_avg: latest.map_or(0.0, |s| s.wpm_avg),
    }
}
