use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Opaque keyed storage for serialized engine state
pub trait StateStore {
    /// Returns `Ok(None)` when nothing was ever saved under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn save(&self, key: &str, payload: &[u8]) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temp file, syncs, then renames over the old record.
    fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(payload)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

/// Keyed records in a single SQLite table
#[derive(Debug)]
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS engine_state (
                key TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    /// Every key with a saved record, in key order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM engine_state ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM engine_state WHERE key = ?1",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO engine_state (key, payload, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![key, payload],
        )?;
        Ok(())
    }
}

/// Process-local store, mostly for tests and embedding hosts
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, payload: impl Into<Vec<u8>>) {
        self.records
            .borrow_mut()
            .insert(key.to_string(), payload.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.borrow().contains_key(key)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        self.insert(key, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path());

        assert_eq!(store.load("nothing").unwrap(), None);
    }

    #[test]
    fn file_store_roundtrip_and_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("nested"));

        store.save("default-stats", b"first").unwrap();
        store.save("default-stats", b"second").unwrap();

        assert_eq!(store.load("default-stats").unwrap(), Some(b"second".to_vec()));
        assert!(store.path_for("default-stats").exists());
        assert!(!store.path_for("default-stats").with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_save_fails_when_dir_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let store = FileStateStore::new(&blocker);

        assert!(store.save("key", b"payload").is_err());
    }

    #[test]
    fn sqlite_store_roundtrip() {
        let store = SqliteStateStore::open_in_memory().unwrap();

        assert_eq!(store.load("gboard-stats").unwrap(), None);

        store.save("gboard-stats", b"one").unwrap();
        store.save("gboard-stats", b"two").unwrap();
        store.save("openboard-stats", b"three").unwrap();

        assert_eq!(store.load("gboard-stats").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.keys().unwrap(), vec!["gboard-stats", "openboard-stats"]);
    }

    #[test]
    fn sqlite_store_persists_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("stats.db");

        SqliteStateStore::open(&path)
            .unwrap()
            .save("key", b"payload")
            .unwrap();

        let reopened = SqliteStateStore::open(&path).unwrap();
        assert_eq!(reopened.load("key").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStateStore::new();

        assert!(!store.contains("key"));
        store.save("key", b"payload").unwrap();

        assert!(store.contains("key"));
        assert_eq!(store.load("key").unwrap(), Some(b"payload".to_vec()));
    }
}
