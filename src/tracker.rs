use chrono::NaiveDate;
use itertools::Itertools;

use crate::clock::Clock;
use crate::config::{SettingKey, Settings};
use crate::error::{PersistenceError, TrackerError, ValidationError};
use crate::progress::{apply_progress, reverse_progress, ProgressReport};
use crate::stats::{self, PracticeSummary, TechniqueUsage, WeeklyProgress};
use crate::storage::{PracticeStore, SnapshotRef};
use crate::store::{EntityStore, Session, SessionId, SongId, TechniqueId};

/// Raw "log practice" form input, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDraft {
    /// `YYYY-MM-DD`, possibly empty
    pub date: String,
    pub duration: i64,
    pub techniques: Vec<TechniqueId>,
    pub songs: Vec<SongId>,
    pub notes: String,
}

impl SessionDraft {
    pub const DEFAULT_DURATION: i64 = 30;

    /// A blank form dated `today`.
    pub fn for_date(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            duration: Self::DEFAULT_DURATION,
            techniques: Vec::new(),
            songs: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn toggle_technique(&mut self, id: TechniqueId) {
        toggle(&mut self.techniques, id);
    }

    pub fn toggle_song(&mut self, id: SongId) {
        toggle(&mut self.songs, id);
    }
}

fn toggle<T: PartialEq>(ids: &mut Vec<T>, id: T) {
    if let Some(pos) = ids.iter().position(|x| *x == id) {
        ids.remove(pos);
    } else {
        ids.push(id);
    }
}

/// Result of a mutation plus whether it reached storage.
///
/// The in-memory change stands even when `persist_error` is set.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub persist_error: Option<PersistenceError>,
}

impl<T> Outcome<T> {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub progress: ProgressReport,
    /// Fresh form contents to show after a successful save
    pub next_draft: SessionDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDeleted {
    pub session: Session,
    pub progress: ProgressReport,
}

/// Owns all practice data and is the only way to change it.
#[derive(Debug)]
pub struct Tracker<S> {
    store: S,
    entities: EntityStore,
    settings: Settings,
    clock: Clock,
    pending_delete: Option<SessionId>,
}

impl<S: PracticeStore> Tracker<S> {
    /// Loads everything from `store`, seeding defaults where nothing was saved.
    pub fn open(store: S, clock: Clock) -> Self {
        let (entities, settings) = store.load_all().into_parts();
        tracing::debug!(
            sessions = entities.sessions().len(),
            techniques = entities.techniques().len(),
            songs = entities.songs().len(),
            "loaded practice data"
        );
        Self {
            store,
            entities,
            settings,
            clock,
            pending_delete: None,
        }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn new_draft(&self) -> SessionDraft {
        SessionDraft::for_date(self.today())
    }

    pub fn create_session(
        &mut self,
        draft: &SessionDraft,
    ) -> Result<Outcome<SessionCreated>, TrackerError> {
        let (date, duration) = validate_basics(draft)?;
        let techniques: Vec<TechniqueId> = draft.techniques.iter().copied().unique().collect();
        let songs: Vec<SongId> = draft.songs.iter().copied().unique().collect();
        if let Some(id) = techniques
            .iter()
            .find(|id| self.entities.find_technique(**id).is_none())
        {
            return Err(ValidationError::UnknownTechnique(*id).into());
        }
        if let Some(id) = songs.iter().find(|id| self.entities.find_song(**id).is_none()) {
            return Err(ValidationError::UnknownSong(*id).into());
        }

        let session = Session {
            id: self.entities.next_session_id(),
            date,
            duration,
            techniques,
            songs,
            notes: draft.notes.clone(),
        };
        let session_id = session.id;
        let (techs, songs) = self.entities.progress_targets_mut();
        let progress = apply_progress(&session, techs, songs, &self.settings);
        self.entities.add_session(session);
        tracing::info!(%session_id, %date, duration, "logged practice session");

        Ok(Outcome {
            value: SessionCreated {
                session_id,
                progress,
                next_draft: self.new_draft(),
            },
            persist_error: self.persist(),
        })
    }

    /// Removes a session and takes back the progress it granted, at current rates.
    pub fn delete_session(
        &mut self,
        id: SessionId,
    ) -> Result<Outcome<SessionDeleted>, TrackerError> {
        let session = self
            .entities
            .remove_session(id)
            .ok_or(TrackerError::NotFound(id))?;
        let (techs, songs) = self.entities.progress_targets_mut();
        let progress = reverse_progress(&session, techs, songs, &self.settings);
        if self.pending_delete == Some(id) {
            self.pending_delete = None;
        }
        tracing::info!(session_id = %id, "deleted practice session");

        Ok(Outcome {
            value: SessionDeleted { session, progress },
            persist_error: self.persist(),
        })
    }

    /// First step of a delete: remember the session until confirmed or cancelled.
    pub fn request_delete(&mut self, id: SessionId) -> Result<&Session, TrackerError> {
        let session = self
            .entities
            .find_session(id)
            .ok_or(TrackerError::NotFound(id))?;
        self.pending_delete = Some(id);
        Ok(session)
    }

    pub fn pending_delete(&self) -> Option<&Session> {
        self.pending_delete
            .and_then(|id| self.entities.find_session(id))
    }

    pub fn cancel_delete(&mut self) -> Option<SessionId> {
        self.pending_delete.take()
    }

    pub fn confirm_delete(&mut self) -> Result<Outcome<SessionDeleted>, TrackerError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(TrackerError::NoPendingDelete)?;
        self.delete_session(id)
    }

    pub fn add_technique(&mut self, name: &str) -> Result<Outcome<TechniqueId>, TrackerError> {
        let id = self
            .entities
            .add_technique(name)
            .ok_or(ValidationError::BlankName)?;
        tracing::info!(technique_id = %id, "added technique");
        Ok(Outcome {
            value: id,
            persist_error: self.persist(),
        })
    }

    pub fn add_song(&mut self, name: &str) -> Result<Outcome<SongId>, TrackerError> {
        let id = self
            .entities
            .add_song(name)
            .ok_or(ValidationError::BlankName)?;
        tracing::info!(song_id = %id, "added song");
        Ok(Outcome {
            value: id,
            persist_error: self.persist(),
        })
    }

    /// Changes one setting (values below 1 become 1) and saves immediately.
    pub fn update_setting(&mut self, key: SettingKey, value: u32) -> Outcome<u32> {
        let stored = self.settings.set(key, value);
        tracing::info!(%key, value = stored, "updated setting");
        Outcome {
            value: stored,
            persist_error: self.persist(),
        }
    }

    pub fn total_practice_time(&self) -> u64 {
        stats::total_practice_time(self.entities.sessions())
    }

    pub fn sessions_in_last_n_days(&self, days: u64) -> Vec<&Session> {
        stats::sessions_in_last_n_days(self.entities.sessions(), self.today(), days)
    }

    pub fn current_streak(&self) -> u32 {
        stats::current_streak(
            self.entities.sessions(),
            self.settings.streak_threshold,
            self.today(),
        )
    }

    pub fn weekly_progress(&self) -> WeeklyProgress {
        stats::weekly_progress(
            self.entities.sessions(),
            self.settings.goal_minutes_per_week,
            self.today(),
        )
    }

    pub fn technique_usage(&self) -> Vec<TechniqueUsage> {
        stats::technique_usage(self.entities.techniques(), self.entities.sessions())
    }

    pub fn summary(&self) -> PracticeSummary {
        stats::summary(self.entities.sessions(), &self.settings, self.today())
    }

    pub fn recent_sessions(&self) -> Vec<&Session> {
        stats::recent_sessions(self.entities.sessions(), stats::RECENT_SESSIONS)
    }

    pub fn sessions_newest_first(&self) -> Vec<&Session> {
        stats::sessions_newest_first(self.entities.sessions())
    }

    fn persist(&self) -> Option<PersistenceError> {
        match self
            .store
            .save_all(SnapshotRef::new(&self.entities, &self.settings))
        {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "failed to save practice data, keeping changes in memory"
                );
                Some(e)
            }
        }
    }
}

fn validate_basics(draft: &SessionDraft) -> Result<(NaiveDate, u32), ValidationError> {
    let raw = draft.date.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingDate);
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?;
    if draft.duration < 1 {
        return Err(ValidationError::NonPositiveDuration(draft.duration));
    }
    let duration = u32::try_from(draft.duration)
        .map_err(|_| ValidationError::DurationOutOfRange(draft.duration))?;
    Ok((date, duration))
}
