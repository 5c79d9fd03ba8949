use crate::event_log::{EventLog, WordEvent};
use crate::session::Session;

/// Default inactivity gap that ends a session
pub const GAP_THRESHOLD_MS: i64 = 5000;

/// Splits the event log into sessions by inactivity gap.
///
/// A gap strictly greater than the threshold starts a new session; a gap
/// exactly equal to the threshold stays in the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sessionizer {
    gap_threshold_ms: i64,
}

impl Sessionizer {
    pub fn new(gap_threshold_ms: i64) -> Self {
        Self { gap_threshold_ms }
    }

    pub fn gap_threshold_ms(&self) -> i64 {
        self.gap_threshold_ms
    }

    pub fn breaks_session(&self, previous: &WordEvent, next: &WordEvent) -> bool {
        next.start_time - previous.end_time > self.gap_threshold_ms
    }

    /// Extends the last session with the event at `index` or opens a new one.
    /// Returns the position in `sessions` of the session that now holds it.
    pub fn on_event_appended(
        &self,
        log: &EventLog,
        sessions: &mut Vec<Session>,
        index: usize,
    ) -> usize {
        let breaks = match index.checked_sub(1).and_then(|prev| log.get(prev)) {
            Some(previous) => log
                .get(index)
                .map_or(false, |event| self.breaks_session(previous, event)),
            None => true,
        };

        match sessions.last_mut() {
            Some(current) if !breaks => current.end_index = index + 1,
            _ => sessions.push(Session::new(index, index + 1)),
        }
        sessions.len() - 1
    }

    /// Partitions the whole log from scratch. Metrics are left at zero.
    pub fn rebuild(&self, log: &EventLog) -> Vec<Session> {
        let mut sessions = Vec::new();
        for index in 0..log.len() {
            self.on_event_appended(log, &mut sessions, index);
        }
        sessions
    }
}

impl Default for Sessionizer {
    fn default() -> Self {
        Self::new(GAP_THRESHOLD_MS)
    }
}

/// Whether `sessions` are ordered, contiguous, non-empty and cover exactly
/// `[0, event_count)`.
pub fn is_partition(sessions: &[Session], event_count: usize) -> bool {
    let mut expected_start = 0;
    for session in sessions {
        if session.start_index != expected_start || session.end_index <= session.start_index {
            return false;
        }
        expected_start = session.end_index;
    }
    expected_start == event_count
}
