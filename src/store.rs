use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_TECHNIQUE_LEVEL: f64 = 10.0;
pub const MAX_SONG_PROGRESS: f64 = 100.0;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

entity_id!(
    /// Identifier of a logged practice session
    SessionId
);
entity_id!(
    /// Identifier of a technique
    TechniqueId
);
entity_id!(
    /// Identifier of a song
    SongId
);

/// A logged block of practice. Never edited after creation, only removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub date: NaiveDate,
    pub duration: u32,
    #[serde(default)]
    pub techniques: Vec<TechniqueId>,
    #[serde(default)]
    pub songs: Vec<SongId>,
    #[serde(default)]
    pub notes: String,
}

impl Session {
    pub fn practiced_technique(&self, id: TechniqueId) -> bool {
        self.techniques.contains(&id)
    }

    pub fn practiced_song(&self, id: SongId) -> bool {
        self.songs.contains(&id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: TechniqueId,
    pub name: String,
    #[serde(default)]
    pub level: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    #[serde(default)]
    pub progress: f64,
}

/// Techniques a fresh install starts with.
pub fn default_techniques() -> Vec<Technique> {
    ["Scales", "Chords", "Fingerpicking", "Bends", "Vibrato"]
        .iter()
        .zip(1u64..)
        .map(|(name, id)| Technique {
            id: TechniqueId::new(id),
            name: name.to_string(),
            level: 0.0,
        })
        .collect()
}

/// Songs a fresh install starts with.
pub fn default_songs() -> Vec<Song> {
    ["Example Song 1", "Example Song 2"]
        .iter()
        .zip(1u64..)
        .map(|(name, id)| Song {
            id: SongId::new(id),
            name: name.to_string(),
            progress: 0.0,
        })
        .collect()
}

/// Highest id ever handed out per collection. Never decreases, so an id
/// is not reused after its entity is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdCounters {
    pub session: u64,
    pub technique: u64,
    pub song: u64,
}

impl IdCounters {
    /// Lowest counters consistent with the data, counting ids that sessions
    /// still reference after their technique or song was removed.
    pub fn observed(sessions: &[Session], techniques: &[Technique], songs: &[Song]) -> Self {
        let session_refs = sessions.iter().flat_map(|s| &s.techniques);
        let song_refs = sessions.iter().flat_map(|s| &s.songs);
        Self {
            session: sessions.iter().map(|s| s.id.value()).max().unwrap_or(0),
            technique: techniques
                .iter()
                .map(|t| t.id)
                .chain(session_refs.copied())
                .map(|id| id.value())
                .max()
                .unwrap_or(0),
            song: songs
                .iter()
                .map(|s| s.id)
                .chain(song_refs.copied())
                .map(|id| id.value())
                .max()
                .unwrap_or(0),
        }
    }

    fn merge(self, other: IdCounters) -> Self {
        Self {
            session: self.session.max(other.session),
            technique: self.technique.max(other.technique),
            song: self.song.max(other.song),
        }
    }
}

/// In-memory collections of sessions, techniques and songs.
///
/// Owns identity only. Insertion order is preserved and doubles as display
/// order; nothing here checks that a session's technique or song ids exist.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityStore {
    sessions: Vec<Session>,
    techniques: Vec<Technique>,
    songs: Vec<Song>,
    counters: IdCounters,
}

impl EntityStore {
    pub fn new(sessions: Vec<Session>, techniques: Vec<Technique>, songs: Vec<Song>) -> Self {
        let counters = IdCounters::observed(&sessions, &techniques, &songs);
        Self {
            sessions,
            techniques,
            songs,
            counters,
        }
    }

    /// Raises the counters to previously saved values; never lowers them.
    pub fn with_counters(mut self, saved: IdCounters) -> Self {
        self.counters = self.counters.merge(saved);
        self
    }

    pub fn counters(&self) -> &IdCounters {
        &self.counters
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Mutable views over both progress-carrying collections at once.
    pub fn progress_targets_mut(&mut self) -> (&mut [Technique], &mut [Song]) {
        (&mut self.techniques, &mut self.songs)
    }

    /// The id the next logged session gets. Ids of removed sessions are not reused.
    pub fn next_session_id(&self) -> SessionId {
        SessionId::new(self.counters.session + 1)
    }

    pub fn add_session(&mut self, session: Session) {
        self.counters.session = self.counters.session.max(session.id.value());
        self.sessions.push(session);
    }

    pub fn find_session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let idx = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(idx))
    }

    /// Appends a technique at level 0. Blank names are ignored.
    pub fn add_technique(&mut self, name: &str) -> Option<TechniqueId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.counters.technique += 1;
        let id = TechniqueId::new(self.counters.technique);
        self.techniques.push(Technique {
            id,
            name: name.to_string(),
            level: 0.0,
        });
        Some(id)
    }

    /// Appends a song at 0% progress. Blank names are ignored.
    pub fn add_song(&mut self, name: &str) -> Option<SongId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.counters.song += 1;
        let id = SongId::new(self.counters.song);
        self.songs.push(Song {
            id,
            name: name.to_string(),
            progress: 0.0,
        });
        Some(id)
    }

    pub fn find_technique(&self, id: TechniqueId) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    pub fn find_song(&self, id: SongId) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Display names of the given techniques, skipping ids that no longer resolve.
    pub fn technique_names(&self, ids: &[TechniqueId]) -> Vec<&str> {
        ids.iter()
            .filter_map(|id| self.find_technique(*id))
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn song_names(&self, ids: &[SongId]) -> Vec<&str> {
        ids.iter()
            .filter_map(|id| self.find_song(*id))
            .map(|s| s.name.as_str())
            .collect()
    }
}
