//! Plain-text rendering for the command line.

use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

use crate::config::{SettingKey, Settings};
use crate::progress::ProgressReport;
use crate::stats::{PracticeSummary, TechniqueUsage, WeeklyProgress};
use crate::store::{EntityStore, Session, Song, Technique, MAX_SONG_PROGRESS, MAX_TECHNIQUE_LEVEL};

const BAR_WIDTH: usize = 20;

/// `fraction` of `width` cells filled, clamped to the bar.
pub fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Left-aligns by display width so wide glyphs in names keep columns straight.
pub fn pad(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - w))
    }
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>, header: &str) -> usize {
    names.map(|n| n.width()).max().unwrap_or(0).max(header.width())
}

pub fn summary(s: &PracticeSummary) -> String {
    format!(
        "Total practice time: {} minutes\nSessions this week:  {}\nCurrent streak:      {} days\n",
        s.total_minutes, s.sessions_last_week, s.streak_days
    )
}

pub fn weekly(progress: &WeeklyProgress, goal_minutes: u32) -> String {
    format!(
        "Weekly goal: {} / {} minutes {} {:.0}%\n",
        progress.minutes,
        goal_minutes,
        bar(progress.percentage / 100.0, BAR_WIDTH),
        progress.percentage
    )
}

pub fn techniques(list: &[Technique]) -> String {
    let width = name_width(list.iter().map(|t| t.name.as_str()), "Technique");
    let mut out = format!("{:>4}  {}  Level\n", "ID", pad("Technique", width));
    for t in list {
        let _ = writeln!(
            out,
            "{:>4}  {}  {} {:.1}/10",
            t.id,
            pad(&t.name, width),
            bar(t.level / MAX_TECHNIQUE_LEVEL, BAR_WIDTH),
            t.level
        );
    }
    out
}

pub fn songs(list: &[Song]) -> String {
    let width = name_width(list.iter().map(|s| s.name.as_str()), "Song");
    let mut out = format!("{:>4}  {}  Progress\n", "ID", pad("Song", width));
    for s in list {
        let _ = writeln!(
            out,
            "{:>4}  {}  {} {:.0}%",
            s.id,
            pad(&s.name, width),
            bar(s.progress / MAX_SONG_PROGRESS, BAR_WIDTH),
            s.progress
        );
    }
    out
}

pub fn usage(list: &[TechniqueUsage]) -> String {
    let width = name_width(list.iter().map(|u| u.name.as_str()), "Technique");
    let mut out = String::new();
    for u in list {
        let _ = writeln!(
            out,
            "{}  {} {} sessions",
            pad(&u.name, width),
            bar(u.share, BAR_WIDTH),
            u.sessions
        );
    }
    out
}

/// Session table; ids that no longer resolve are left out of the name lists.
pub fn sessions(entities: &EntityStore, list: &[&Session]) -> String {
    if list.is_empty() {
        return "No practice sessions logged yet.\n".to_string();
    }
    let mut out = format!(
        "{:>6}  {:<10}  {:>8}  {}\n",
        "ID", "Date", "Minutes", "Techniques / Songs"
    );
    for s in list {
        let mut practiced = entities.technique_names(&s.techniques);
        practiced.extend(entities.song_names(&s.songs));
        let _ = writeln!(
            out,
            "{:>6}  {:<10}  {:>8}  {}",
            s.id,
            s.date.to_string(),
            s.duration,
            practiced.join(", ")
        );
        if !s.notes.trim().is_empty() {
            let _ = writeln!(out, "{:>6}  {}", "", s.notes.trim());
        }
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    let keys = [
        SettingKey::LevelUpMinutes,
        SettingKey::SongCompletionMinutes,
        SettingKey::StreakThreshold,
        SettingKey::GoalMinutesPerWeek,
    ];
    let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();
    let width = name_width(labels.iter().map(String::as_str), "");
    let mut out = String::new();
    for (key, label) in keys.iter().zip(&labels) {
        let _ = writeln!(out, "{}  {}", pad(label, width), settings.get(*key));
    }
    let overview = settings.overview();
    let _ = writeln!(out);
    let _ = writeln!(out, "Technique leveling:  {:.2} levels per hour", overview.levels_per_hour);
    let _ = writeln!(out, "Song progress:       {:.2}% per hour", overview.song_percent_per_hour);
    let _ = writeln!(out, "Daily practice goal: {} minutes per day", overview.daily_goal_minutes);
    out
}

/// One line per technique or song a create/delete touched.
pub fn progress_report(entities: &EntityStore, report: &ProgressReport) -> String {
    let mut out = String::new();
    for c in &report.techniques {
        let name = entities.find_technique(c.id).map_or("?", |t| t.name.as_str());
        let _ = writeln!(out, "  {}: level {:.2} -> {:.2}", name, c.before, c.after);
    }
    for c in &report.songs {
        let name = entities.find_song(c.id).map_or("?", |s| s.name.as_str());
        let _ = writeln!(out, "  {}: {:.1}% -> {:.1}%", name, c.before, c.after);
    }
    out
}
