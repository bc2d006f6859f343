use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;

use crate::config::Settings;
use crate::error::PersistenceError;
use crate::store::{
    default_songs, default_techniques, EntityStore, IdCounters, Session, Song, Technique,
};

pub const SESSIONS_KEY: &str = "practiceSessions";
pub const TECHNIQUES_KEY: &str = "techniques";
pub const SONGS_KEY: &str = "songs";
pub const SETTINGS_KEY: &str = "settings";
pub const COUNTERS_KEY: &str = "idCounters";

const UPSERT: &str = r#"
    INSERT INTO entries (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE
    SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
"#;

/// Everything that gets persisted, as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub techniques: Vec<Technique>,
    pub songs: Vec<Song>,
    pub settings: Settings,
    pub counters: IdCounters,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            techniques: default_techniques(),
            songs: default_songs(),
            settings: Settings::default(),
            counters: IdCounters::default(),
        }
    }
}

impl Snapshot {
    pub fn into_parts(self) -> (EntityStore, Settings) {
        (
            EntityStore::new(self.sessions, self.techniques, self.songs)
                .with_counters(self.counters),
            self.settings,
        )
    }

    pub fn view(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            sessions: &self.sessions,
            techniques: &self.techniques,
            songs: &self.songs,
            settings: &self.settings,
            counters: &self.counters,
        }
    }
}

/// Borrowed view handed to `save_all`, so saving never clones the store.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRef<'a> {
    pub sessions: &'a [Session],
    pub techniques: &'a [Technique],
    pub songs: &'a [Song],
    pub settings: &'a Settings,
    pub counters: &'a IdCounters,
}

impl<'a> SnapshotRef<'a> {
    pub fn new(store: &'a EntityStore, settings: &'a Settings) -> Self {
        Self {
            sessions: store.sessions(),
            techniques: store.techniques(),
            songs: store.songs(),
            settings,
            counters: store.counters(),
        }
    }

    fn encode(&self) -> Result<[(&'static str, String); 5], PersistenceError> {
        Ok([
            (SESSIONS_KEY, serde_json::to_string(self.sessions)?),
            (TECHNIQUES_KEY, serde_json::to_string(self.techniques)?),
            (SONGS_KEY, serde_json::to_string(self.songs)?),
            (SETTINGS_KEY, serde_json::to_string(self.settings)?),
            (COUNTERS_KEY, serde_json::to_string(self.counters)?),
        ])
    }
}

/// Key-value persistence for the tracker.
pub trait PracticeStore {
    /// Reads one raw value. `Ok(None)` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn save_all(&self, snapshot: SnapshotRef<'_>) -> Result<(), PersistenceError>;

    /// Loads every key on its own; anything absent or unreadable gets its default.
    fn load_all(&self) -> Snapshot {
        Snapshot {
            sessions: load_or(self, SESSIONS_KEY, Vec::new),
            techniques: load_or(self, TECHNIQUES_KEY, default_techniques),
            songs: load_or(self, SONGS_KEY, default_songs),
            settings: load_or(self, SETTINGS_KEY, Settings::default).sanitized(),
            counters: load_or(self, COUNTERS_KEY, IdCounters::default),
        }
    }
}

fn load_or<S, T, F>(store: &S, key: &str, fallback: F) -> T
where
    S: PracticeStore + ?Sized,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.read(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is unreadable, using default");
                fallback()
            }
        },
        Ok(None) => fallback(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored value, using default");
            fallback()
        }
    }
}

/// SQLite-backed store with a single key-value table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    /// Writes one raw value as-is. Useful for importing data saved elsewhere.
    pub fn write_raw(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn.execute(UPSERT, params![key, value])?;
        Ok(())
    }
}

impl PracticeStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save_all(&self, snapshot: SnapshotRef<'_>) -> Result<(), PersistenceError> {
        let entries = snapshot.encode()?;
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in &entries {
            tx.execute(UPSERT, params![key, value])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Map-backed store for tests. Can be told to fail writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: &Snapshot) -> Self {
        let store = Self::new();
        // encoding plain data into a map cannot fail
        let _ = store.save_all(snapshot.view());
        store
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl PracticeStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save_all(&self, snapshot: SnapshotRef<'_>) -> Result<(), PersistenceError> {
        if self.fail_writes.get() {
            return Err(PersistenceError::Unavailable("writes disabled".into()));
        }
        let entries = snapshot.encode()?;
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }
}
