use crate::aggregate::{recompute_global, GlobalStats};
use crate::error::{Result, StatsError};
use crate::event_log::{EventLog, WordEvent};
use crate::migration::{migrate, SCHEMA_VERSION};
use crate::session::Session;
use crate::sessionizer::{is_partition, Sessionizer};
use crate::store::StateStore;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Complete snapshot of events, sessions and aggregates; this is what gets
/// persisted. Records written before versioning decode with version 0 and
/// zeroed aggregates, but the timestamps, events and sessions are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default)]
    pub schema_version: u32,
    pub created: i64,
    pub last_modified: i64,
    pub event_log: EventLog,
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub global: GlobalStats,
}

impl EngineState {
    pub fn new(now: i64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created: now,
            last_modified: now,
            event_log: EventLog::new(),
            sessions: Vec::new(),
            global: GlobalStats::default(),
        }
    }

    /// Append, sessionize, then refresh the touched session and the globals.
    pub fn record(&mut self, sessionizer: &Sessionizer, event: WordEvent, now: i64) -> usize {
        let index = self.event_log.append(event);
        let touched = sessionizer.on_event_appended(&self.event_log, &mut self.sessions, index);
        self.sessions[touched].recompute(&self.event_log);
        self.global = recompute_global(&self.event_log, &self.sessions);
        self.last_modified = now;
        index
    }

    /// Recomputes every session and the globals without touching timestamps.
    pub fn refresh_metrics(&mut self) {
        for session in &mut self.sessions {
            session.recompute(&self.event_log);
        }
        self.global = recompute_global(&self.event_log, &self.sessions);
    }

    /// Clears events and sessions. Keeps `created` and `schema_version`.
    pub fn wipe(&mut self, now: i64) {
        self.event_log.clear();
        self.sessions.clear();
        self.global = recompute_global(&self.event_log, &self.sessions);
        self.last_modified = now;
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// What `StatsEngine::load` did with the stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The record replaced the in-memory state.
    Restored { events: usize, sessions: usize },
    /// Nothing stored under this profile yet.
    NotFound,
    /// The record could not be trusted and was ignored.
    Discarded,
}

/// Owns one profile's `EngineState` and runs every operation on it
#[derive(Debug, Clone)]
pub struct StatsEngine {
    profile: String,
    sessionizer: Sessionizer,
    state: EngineState,
}

impl StatsEngine {
    pub fn new(profile: impl Into<String>, sessionizer: Sessionizer) -> Self {
        Self {
            profile: profile.into(),
            sessionizer,
            state: EngineState::new(now_ms()),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(
            config.profile.clone(),
            Sessionizer::new(config.gap_threshold_ms),
        )
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Key the state is stored under, one per profile.
    pub fn storage_key(&self) -> String {
        format!("{}-stats", self.profile)
    }

    pub fn sessionizer(&self) -> &Sessionizer {
        &self.sessionizer
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn global(&self) -> &GlobalStats {
        &self.state.global
    }

    pub fn sessions(&self) -> &[Session] {
        &self.state.sessions
    }

    pub fn event_log(&self) -> &EventLog {
        &self.state.event_log
    }

    pub fn record_word(&mut self, text: impl Into<String>, start_time: i64, end_time: i64) -> usize {
        let event = WordEvent::new(text, start_time, end_time);
        let index = self.state.record(&self.sessionizer, event, now_ms());
        debug!(
            profile = %self.profile,
            index,
            sessions = self.state.sessions.len(),
            "recorded word"
        );
        index
    }

    /// Appends a batch of already-recorded words and recomputes once at the end.
    /// Nothing is appended unless every event is valid and in order.
    pub fn import_events(&mut self, events: Vec<WordEvent>) -> Result<usize> {
        let mut previous = self.state.event_log.last();
        for event in &events {
            event.validate()?;
            if let Some(previous) = previous {
                event.validate_after(previous)?;
            }
            previous = Some(event);
        }

        let count = events.len();
        for event in events {
            let index = self.state.event_log.append(event);
            self.sessionizer
                .on_event_appended(&self.state.event_log, &mut self.state.sessions, index);
        }
        self.recompute_all();
        info!(profile = %self.profile, count, "imported words");
        Ok(count)
    }

    pub fn recompute_all(&mut self) {
        self.state.refresh_metrics();
        self.state.last_modified = now_ms();
    }

    pub fn wipe(&mut self) {
        self.state.wipe(now_ms());
        info!(profile = %self.profile, "stats wiped");
    }

    /// Switches the gap threshold and re-partitions the whole log with it.
    pub fn set_gap_threshold(&mut self, gap_threshold_ms: i64) {
        self.sessionizer = Sessionizer::new(gap_threshold_ms);
        self.state.sessions = self.sessionizer.rebuild(&self.state.event_log);
        self.recompute_all();
        info!(
            profile = %self.profile,
            gap_threshold_ms,
            sessions = self.state.sessions.len(),
            "re-sessionized"
        );
    }

    /// Serializes the state into `store`. A failure leaves the engine as it was.
    pub fn save(&self, store: &dyn StateStore) -> Result<()> {
        let key = self.storage_key();
        let result = self
            .state
            .to_bytes()
            .and_then(|bytes| store.save(&key, &bytes));
        match &result {
            Ok(()) => info!(%key, events = self.state.event_log.len(), "stats saved"),
            Err(e) => error!(%key, "failed to save stats: {}", e),
        }
        result
    }

    /// Replaces the in-memory state with the stored record, migrated to the
    /// current schema. The state is left unchanged unless `Restored` is returned.
    pub fn load(&mut self, store: &dyn StateStore) -> Result<LoadOutcome> {
        let key = self.storage_key();

        let bytes = match store.load(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(%key, "no saved stats, starting fresh");
                return Ok(LoadOutcome::NotFound);
            }
            Err(e) => {
                error!(%key, "failed to load stats: {}", e);
                return Err(e);
            }
        };

        let decoded = match EngineState::from_bytes(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(%key, "ignoring unreadable stats record: {}", e);
                return Ok(LoadOutcome::Discarded);
            }
        };

        if !is_partition(&decoded.sessions, decoded.event_log.len()) {
            warn!(%key, "ignoring stats record whose sessions do not cover its events");
            return Ok(LoadOutcome::Discarded);
        }

        let migrated = migrate(decoded).map_err(|e| {
            if let StatsError::UnsupportedSchema { found, supported } = &e {
                error!(%key, found, supported, "refusing stats written by a newer build");
            }
            e
        })?;

        let outcome = LoadOutcome::Restored {
            events: migrated.event_log.len(),
            sessions: migrated.sessions.len(),
        };
        self.state = migrated;
        info!(%key, ?outcome, "stats loaded");
        Ok(outcome)
    }
}
