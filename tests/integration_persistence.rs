use assert_matches::assert_matches;
use std::fs;
use swipe_stats::config::Backend;
use swipe_stats::app_dirs::AppDirs;
use swipe_stats::engine::EngineState;
use swipe_stats::migration::SCHEMA_VERSION;
use swipe_stats::session::Session;
use swipe_stats::sessionizer::Sessionizer;
use swipe_stats::store::{FileStateStore, SqliteStateStore, StateStore};
use swipe_stats::{LoadOutcome, StatsEngine, StatsError};
use tempfile::TempDir;

fn sample_engine(profile: &str) -> StatsEngine {
    let mut engine = StatsEngine::new(profile, Sessionizer::default());
    engine.record_word("cat", 0, 500);
    engine.record_word("dog", 600, 1100);
    engine.record_word("fish", 6600, 7100);
    engine.record_word("naïve", 7200, 7650);
    engine
}

fn assert_roundtrip(store: &dyn StateStore) {
    let engine = sample_engine("roundtrip");
    engine.save(store).unwrap();

    let mut restored = StatsEngine::new("roundtrip", Sessionizer::default());
    let outcome = restored.load(store).unwrap();

    assert_eq!(outcome, LoadOutcome::Restored { events: 4, sessions: 2 });
    assert_eq!(restored.state(), engine.state());
    assert_eq!(
        restored.sessions().iter().map(Session::range).collect::<Vec<_>>(),
        vec![0..2, 2..4]
    );
}

#[test]
fn file_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    assert_roundtrip(&FileStateStore::new(dir.path()));
}

#[test]
fn sqlite_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    assert_roundtrip(&SqliteStateStore::open(dir.path().join("stats.db")).unwrap());
}

#[test]
fn state_survives_reopening_the_store() {
    let dir = TempDir::new().unwrap();

    for backend in [Backend::File, Backend::Sqlite] {
        let saved = sample_engine("reopen");
        {
            let store = AppDirs::open_store(backend, dir.path()).unwrap();
            saved.save(store.as_ref()).unwrap();
        }

        let store = AppDirs::open_store(backend, dir.path()).unwrap();
        let mut loaded = StatsEngine::new("reopen", Sessionizer::default());
        loaded.load(store.as_ref()).unwrap();

        assert_eq!(loaded.state(), saved.state(), "backend {backend}");
    }
}

#[test]
fn profiles_are_kept_apart() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());

    sample_engine("gboard").save(&store).unwrap();
    let mut openboard = StatsEngine::new("openboard", Sessionizer::default());
    openboard.record_word("solo", 0, 300);
    openboard.save(&store).unwrap();

    let mut gboard = StatsEngine::new("gboard", Sessionizer::default());
    gboard.load(&store).unwrap();
    let mut reloaded_openboard = StatsEngine::new("openboard", Sessionizer::default());
    reloaded_openboard.load(&store).unwrap();

    assert_eq!(gboard.event_log().len(), 4);
    assert_eq!(reloaded_openboard.event_log().len(), 1);
    assert!(store.path_for("gboard-stats").exists());
    assert!(store.path_for("openboard-stats").exists());
}

#[test]
fn load_replaces_rather_than_merges() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());
    sample_engine("replace").save(&store).unwrap();

    let mut engine = StatsEngine::new("replace", Sessionizer::default());
    engine.record_word("local", 100_000, 100_500);
    engine.load(&store).unwrap();

    assert_eq!(engine.event_log().len(), 4);
    assert!(engine.event_log().iter().all(|e| e.text != "local"));
}

#[test]
fn legacy_file_on_disk_is_migrated() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());
    fs::write(
        store.path_for("legacy-stats"),
        r#"{
            "created": 1700000000000,
            "last_modified": 1700000005000,
            "event_log": [
                {"text": "cat", "start_time": 0, "end_time": 500},
                {"text": "dog", "start_time": 600, "end_time": 1100},
                {"text": "fish", "start_time": 6600, "end_time": 7100}
            ],
            "sessions": [
                {"start_index": 0, "end_index": 2, "cpm_avg": 1.0, "wpm_avg": 1.0},
                {"start_index": 2, "end_index": 3}
            ],
            "global": {"words_per_min_avg": 3.0}
        }"#,
    )
    .unwrap();

    let mut engine = StatsEngine::new("legacy", Sessionizer::default());
    engine.load(&store).unwrap();

    let state = engine.state();
    assert_eq!(state.schema_version, SCHEMA_VERSION);
    assert_eq!(state.created, 1_700_000_000_000);
    assert_eq!(state.sessions[0].cpm_avg, 6.0 / (1100.0 / 60_000.0));
    assert_eq!(state.global.time_between_words_avg, 100.0);

    // once migrated and saved, reloading is a no-op migration
    engine.save(&store).unwrap();
    let mut again = StatsEngine::new("legacy", Sessionizer::default());
    again.load(&store).unwrap();
    assert_eq!(again.state(), engine.state());
}

#[test]
fn truncated_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let store = FileStateStore::new(dir.path());
    let mut bytes = sample_engine("cut").state().to_bytes().unwrap();
    bytes.truncate(bytes.len() / 2);
    fs::write(store.path_for("cut-stats"), bytes).unwrap();

    let mut engine = StatsEngine::new("cut", Sessionizer::default());

    assert_eq!(engine.load(&store).unwrap(), LoadOutcome::Discarded);
    assert!(engine.event_log().is_empty());
}

#[test]
fn well_formed_json_of_another_shape_is_ignored() {
    let dir = TempDir::new().unwrap();
    let payloads = [
        "{}",
        "[]",
        r#"{"cpmAvg":12.5,"wpmAvg":3.0}"#,
        r#"{"created":1,"last_modified":2,"event_log":[]}"#,
    ];

    for backend in [Backend::File, Backend::Sqlite] {
        let store = AppDirs::open_store(backend, dir.path()).unwrap();
        for payload in payloads {
            store.save("shape-stats", payload.as_bytes()).unwrap();

            let mut engine = sample_engine("shape");
            let before = engine.state().clone();

            assert_eq!(
                engine.load(store.as_ref()).unwrap(),
                LoadOutcome::Discarded,
                "backend {backend}, payload {payload}"
            );
            assert_eq!(engine.state(), &before, "backend {backend}, payload {payload}");
        }
    }
}

#[test]
fn newer_schema_is_refused() {
    let store = SqliteStateStore::open_in_memory().unwrap();
    let mut future = EngineState::new(0);
    future.schema_version = SCHEMA_VERSION + 1;
    store.save("future-stats", &future.to_bytes().unwrap()).unwrap();

    let mut engine = StatsEngine::new("future", Sessionizer::default());

    assert_matches!(
        engine.load(&store),
        Err(StatsError::UnsupportedSchema { found, .. }) if found == SCHEMA_VERSION + 1
    );
    assert_eq!(engine.state().schema_version, SCHEMA_VERSION);
}

#[test]
fn failed_save_keeps_memory_state() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file where a directory should be").unwrap();
    let store = FileStateStore::new(&blocker);

    let mut engine = sample_engine("blocked");
    let before = engine.state().clone();

    assert_matches!(engine.save(&store), Err(StatsError::Io(_)));
    assert_eq!(engine.state(), &before);

    engine.record_word("after", 20_000, 20_300);
    assert_eq!(engine.event_log().len(), 5);
}
