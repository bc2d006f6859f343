use serde::Serialize;
use std::io::Write;

use crate::store::{EntityStore, Session};

#[derive(Debug, Serialize)]
struct SessionRow<'a> {
    id: u64,
    date: String,
    duration: u32,
    techniques: String,
    songs: String,
    notes: &'a str,
}

/// Writes sessions as CSV with a header row. Technique and song columns hold
/// `;`-separated names; references that no longer resolve are dropped.
pub fn write_sessions_csv<W: Write>(
    writer: W,
    entities: &EntityStore,
    sessions: &[&Session],
) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for s in sessions {
        wtr.serialize(SessionRow {
            id: s.id.value(),
            date: s.date.to_string(),
            duration: s.duration,
            techniques: entities.technique_names(&s.techniques).join(";"),
            songs: entities.song_names(&s.songs).join(";"),
            notes: &s.notes,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
