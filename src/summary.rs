use crate::aggregate::GlobalStats;
use crate::engine::StatsEngine;
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use time_humanize::HumanTime;

/// Read-only view of one profile's aggregates for display
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub profile: String,
    pub words: usize,
    pub sessions: usize,
    pub created: i64,
    pub last_modified: i64,
    pub global: GlobalStats,
}

impl Summary {
    pub fn of(engine: &StatsEngine) -> Self {
        let state = engine.state();
        Self {
            profile: engine.profile().to_string(),
            words: state.event_log.len(),
            sessions: state.sessions.len(),
            created: state.created,
            last_modified: state.last_modified,
            global: state.global.clone(),
        }
    }
}

fn local_time(ms: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(ms).single()
}

/// "3 minutes ago" style age of `ms` relative to `now_ms`
pub fn age(ms: i64, now_ms: i64) -> String {
    let secs = (now_ms - ms).max(0) / 1000;
    HumanTime::from_seconds(-secs).to_string()
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.global;
        writeln!(f, "profile:                 {}", self.profile)?;
        writeln!(f, "words:                   {}", self.words)?;
        writeln!(f, "sessions:                {}", self.sessions)?;
        writeln!(f, "chars per minute:        {:.1}", g.chars_per_min_avg)?;
        writeln!(f, "words per minute:        {:.1}", g.words_per_min_avg)?;
        writeln!(f, "latest session cpm:      {:.1}", g.cpm_latest_avg)?;
        writeln!(f, "latest session wpm:      {:.1}", g.wpm_latest_avg)?;
        writeln!(f, "chars per session:       {:.1}", g.chars_per_session_avg)?;
        writeln!(f, "words per session:       {:.1}", g.words_per_session_avg)?;
        writeln!(f, "swipe duration:          {:.1} ms", g.swipe_duration_avg)?;
        writeln!(f, "time between words:      {:.1} ms", g.time_between_words_avg)?;
        if let Some(created) = local_time(self.created) {
            writeln!(f, "created:                 {}", created.format("%Y-%m-%d %H:%M:%S"))?;
        }
        if let Some(modified) = local_time(self.last_modified) {
            write!(
                f,
                "last modified:           {} ({})",
                modified.format("%Y-%m-%d %H:%M:%S"),
                age(self.last_modified, crate::util::now_ms())
            )?;
        }
        Ok(())
    }
}
