//! Converts practice minutes into technique levels and song progress.
//!
//! Reversal recomputes the nominal gain from the session's duration and the
//! settings passed in. Two consequences follow:
//!
//! - a gain that was partly absorbed by the upper bound is subtracted in
//!   full, so the value can end up below where it was before the session;
//! - if the rates changed since the session was applied, the amount removed
//!   differs from the amount that was added.
//!
//! Values never leave their bounds either way.

use crate::config::Settings;
use crate::store::{
    Session, Song, SongId, Technique, TechniqueId, MAX_SONG_PROGRESS, MAX_TECHNIQUE_LEVEL,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<Id> {
    pub id: Id,
    pub before: f64,
    pub after: f64,
}

impl<Id> Change<Id> {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// Every technique and song a session touched, with values on both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressReport {
    pub techniques: Vec<Change<TechniqueId>>,
    pub songs: Vec<Change<SongId>>,
}

impl ProgressReport {
    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty() && self.songs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Apply,
    Reverse,
}

pub fn apply_progress(
    session: &Session,
    techniques: &mut [Technique],
    songs: &mut [Song],
    settings: &Settings,
) -> ProgressReport {
    adjust(session, techniques, songs, settings, Direction::Apply)
}

pub fn reverse_progress(
    session: &Session,
    techniques: &mut [Technique],
    songs: &mut [Song],
    settings: &Settings,
) -> ProgressReport {
    adjust(session, techniques, songs, settings, Direction::Reverse)
}

fn adjust(
    session: &Session,
    techniques: &mut [Technique],
    songs: &mut [Song],
    settings: &Settings,
    direction: Direction,
) -> ProgressReport {
    let level_gain = settings.level_gain(session.duration);
    let song_gain = settings.song_gain(session.duration);
    let mut report = ProgressReport::default();

    for tech in techniques
        .iter_mut()
        .filter(|t| session.practiced_technique(t.id))
    {
        let before = tech.level;
        tech.level = step(before, level_gain, MAX_TECHNIQUE_LEVEL, direction);
        report.techniques.push(Change {
            id: tech.id,
            before,
            after: tech.level,
        });
    }

    for song in songs.iter_mut().filter(|s| session.practiced_song(s.id)) {
        let before = song.progress;
        song.progress = step(before, song_gain, MAX_SONG_PROGRESS, direction);
        report.songs.push(Change {
            id: song.id,
            before,
            after: song.progress,
        });
    }

    tracing::debug!(
        session_id = %session.id,
        ?direction,
        techniques = report.techniques.len(),
        songs = report.songs.len(),
        "adjusted progress"
    );
    report
}

fn step(value: f64, amount: f64, max: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Apply => (value + amount).min(max),
        Direction::Reverse => (value - amount).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{default_songs, default_techniques, SessionId};

    fn session(duration: u32, techniques: &[u64], songs: &[u64]) -> Session {
        Session {
            id: SessionId::new(1),
            date: "2024-05-01".parse().unwrap(),
            duration,
            techniques: techniques.iter().copied().map(TechniqueId::new).collect(),
            songs: songs.iter().copied().map(SongId::new).collect(),
            notes: String::new(),
        }
    }

    #[test]
    fn sixty_minutes_is_one_level() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        let report = apply_progress(
            &session(60, &[1], &[]),
            &mut techs,
            &mut songs,
            &Settings::default(),
        );
        assert_eq!(techs[0].level, 1.0);
        assert_eq!(techs[1].level, 0.0);
        assert_eq!(report.techniques.len(), 1);
        assert_eq!(report.techniques[0].delta(), 1.0);
        assert!(report.songs.is_empty());
    }

    #[test]
    fn song_progress_scales_with_completion_minutes() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        apply_progress(
            &session(30, &[], &[2]),
            &mut techs,
            &mut songs,
            &Settings::default(),
        );
        assert_eq!(songs[0].progress, 0.0);
        assert_eq!(songs[1].progress, 25.0);
    }

    #[test]
    fn gains_are_clamped_at_the_top() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        techs[0].level = 9.5;
        songs[0].progress = 90.0;
        apply_progress(
            &session(120, &[1], &[1]),
            &mut techs,
            &mut songs,
            &Settings::default(),
        );
        assert_eq!(techs[0].level, 10.0);
        assert_eq!(songs[0].progress, 100.0);
    }

    #[test]
    fn reverse_undoes_an_unclamped_apply() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        techs[2].level = 3.25;
        songs[1].progress = 40.0;
        let before = (techs.clone(), songs.clone());
        let s = session(45, &[3], &[2]);
        let settings = Settings::default();

        apply_progress(&s, &mut techs, &mut songs, &settings);
        assert_ne!((techs.clone(), songs.clone()), before);
        reverse_progress(&s, &mut techs, &mut songs, &settings);
        assert_eq!((techs, songs), before);
    }

    #[test]
    fn reverse_after_clamp_under_restores() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        techs[0].level = 9.5;
        let s = session(60, &[1], &[]);
        let settings = Settings::default();

        apply_progress(&s, &mut techs, &mut songs, &settings);
        assert_eq!(techs[0].level, 10.0);
        reverse_progress(&s, &mut techs, &mut songs, &settings);
        assert_eq!(techs[0].level, 9.0);
    }

    #[test]
    fn reverse_never_goes_below_zero() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        techs[0].level = 0.25;
        songs[0].progress = 10.0;
        reverse_progress(
            &session(60, &[1], &[1]),
            &mut techs,
            &mut songs,
            &Settings::default(),
        );
        assert_eq!(techs[0].level, 0.0);
        assert_eq!(songs[0].progress, 0.0);
    }

    #[test]
    fn reverse_uses_the_settings_it_is_given() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        let s = session(60, &[1], &[]);
        apply_progress(&s, &mut techs, &mut songs, &Settings::default());
        let slower = Settings {
            level_up_minutes: 120,
            ..Settings::default()
        };
        reverse_progress(&s, &mut techs, &mut songs, &slower);
        assert_eq!(techs[0].level, 0.5);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut techs = default_techniques();
        let mut songs = default_songs();
        let report = apply_progress(
            &session(60, &[42], &[7]),
            &mut techs,
            &mut songs,
            &Settings::default(),
        );
        assert!(report.is_empty());
        assert!(techs.iter().all(|t| t.level == 0.0));
        assert!(songs.iter().all(|s| s.progress == 0.0));
    }
}
