use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;
use std::cmp::Reverse;

use crate::config::Settings;
use crate::store::{Session, Technique, TechniqueId};

pub const DEFAULT_WINDOW_DAYS: u64 = 7;
pub const RECENT_SESSIONS: usize = 5;

/// Minutes logged this week against the weekly goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeeklyProgress {
    pub minutes: u64,
    /// 0 to 100
    pub percentage: f64,
}

/// How often a technique shows up across all sessions
#[derive(Debug, Clone, PartialEq)]
pub struct TechniqueUsage {
    pub id: TechniqueId,
    pub name: String,
    pub sessions: usize,
    /// Fraction of all sessions, 0.0 to 1.0
    pub share: f64,
}

/// Numbers shown at the top of every dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSummary {
    pub total_minutes: u64,
    pub sessions_last_week: usize,
    pub streak_days: u32,
}

pub fn total_practice_time(sessions: &[Session]) -> u64 {
    sessions.iter().map(|s| s.duration as u64).sum()
}

/// Sessions dated on or after `today - days`. Future dates are included.
pub fn sessions_in_last_n_days(sessions: &[Session], today: NaiveDate, days: u64) -> Vec<&Session> {
    let cutoff = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
    sessions.iter().filter(|s| s.date >= cutoff).collect()
}

/// Minutes per calendar day, for every day with at least one session.
pub fn daily_minutes(sessions: &[Session]) -> Vec<(NaiveDate, u64)> {
    sessions
        .iter()
        .map(|s| (s.date, s.duration as u64))
        .into_grouping_map()
        .sum()
        .into_iter()
        .sorted_by_key(|(date, _)| Reverse(*date))
        .collect()
}

/// Consecutive qualifying days ending today or yesterday.
///
/// A day qualifies when its summed minutes reach `threshold`. Only the most
/// recent qualifying day anchors the streak, so a session dated in the
/// future breaks it.
pub fn current_streak(sessions: &[Session], threshold: u32, today: NaiveDate) -> u32 {
    let days: Vec<NaiveDate> = daily_minutes(sessions)
        .into_iter()
        .filter(|(_, minutes)| *minutes >= threshold as u64)
        .map(|(date, _)| date)
        .collect();

    let Some(latest) = days.first() else {
        return 0;
    };
    let yesterday = today.pred_opt();
    if *latest != today && Some(*latest) != yesterday {
        return 0;
    }

    let gaps = days.iter().tuple_windows().take_while(|(newer, older)| {
        newer.signed_duration_since(**older).num_days() == 1
    });
    1 + gaps.count() as u32
}

/// The Sunday on or before `today`.
pub fn start_of_week(today: NaiveDate) -> NaiveDate {
    let back = today.weekday().num_days_from_sunday() as u64;
    today - Days::new(back)
}

pub fn weekly_progress(
    sessions: &[Session],
    goal_minutes: u32,
    today: NaiveDate,
) -> WeeklyProgress {
    let week_start = start_of_week(today);
    let minutes = sessions
        .iter()
        .filter(|s| s.date >= week_start)
        .map(|s| s.duration as u64)
        .sum::<u64>();
    let percentage = if goal_minutes == 0 {
        100.0
    } else {
        (minutes as f64 / goal_minutes as f64 * 100.0).min(100.0)
    };
    WeeklyProgress {
        minutes,
        percentage,
    }
}

pub fn technique_usage(techniques: &[Technique], sessions: &[Session]) -> Vec<TechniqueUsage> {
    techniques
        .iter()
        .map(|tech| {
            let count = sessions
                .iter()
                .filter(|s| s.practiced_technique(tech.id))
                .count();
            let share = if sessions.is_empty() {
                0.0
            } else {
                count as f64 / sessions.len() as f64
            };
            TechniqueUsage {
                id: tech.id,
                name: tech.name.clone(),
                sessions: count,
                share,
            }
        })
        .collect()
}

/// The last `n` sessions logged, newest first.
pub fn recent_sessions(sessions: &[Session], n: usize) -> Vec<&Session> {
    sessions.iter().rev().take(n).collect()
}

/// All sessions by date, newest first. Same-day sessions keep log order.
pub fn sessions_newest_first(sessions: &[Session]) -> Vec<&Session> {
    sessions
        .iter()
        .sorted_by_key(|s| Reverse(s.date))
        .collect()
}

pub fn summary(sessions: &[Session], settings: &Settings, today: NaiveDate) -> PracticeSummary {
    PracticeSummary {
        total_minutes: total_practice_time(sessions),
        sessions_last_week: sessions_in_last_n_days(sessions, today, DEFAULT_WINDOW_DAYS).len(),
        streak_days: current_streak(sessions, settings.streak_threshold, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{default_techniques, SessionId};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn session(id: u64, day: NaiveDate, duration: u32) -> Session {
        Session {
            id: SessionId::new(id),
            date: day,
            duration,
            techniques: vec![],
            songs: vec![],
            notes: String::new(),
        }
    }

    fn days_ago(today: NaiveDate, n: u64) -> NaiveDate {
        today - Days::new(n)
    }

    #[test]
    fn total_sums_durations() {
        let today = date("2024-06-12");
        let sessions = vec![session(1, today, 30), session(2, today, 45)];
        assert_eq!(total_practice_time(&sessions), 75);
        assert_eq!(total_practice_time(&[]), 0);
    }

    #[test]
    fn last_n_days_is_inclusive_at_day_resolution() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, days_ago(today, 8), 10),
            session(2, days_ago(today, 7), 10),
            session(3, days_ago(today, 1), 10),
            session(4, today, 10),
        ];
        let ids: Vec<u64> = sessions_in_last_n_days(&sessions, today, 7)
            .iter()
            .map(|s| s.id.value())
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(sessions_in_last_n_days(&sessions, today, 0).len(), 1);
    }

    #[test]
    fn streak_is_zero_without_sessions() {
        assert_eq!(current_streak(&[], 1, date("2024-06-12")), 0);
    }

    #[test]
    fn streak_counts_three_consecutive_days_ending_today() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, days_ago(today, 2), 20),
            session(2, days_ago(today, 1), 20),
            session(3, today, 20),
        ];
        assert_eq!(current_streak(&sessions, 1, today), 3);
    }

    #[test]
    fn streak_may_end_yesterday() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, days_ago(today, 2), 20),
            session(2, days_ago(today, 1), 20),
        ];
        assert_eq!(current_streak(&sessions, 1, today), 2);
    }

    #[test]
    fn streak_is_broken_by_an_old_last_session() {
        let today = date("2024-06-12");
        let sessions = vec![session(1, days_ago(today, 10), 60)];
        assert_eq!(current_streak(&sessions, 1, today), 0);
    }

    #[test]
    fn streak_stops_at_the_first_gap() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, days_ago(today, 5), 20),
            session(2, days_ago(today, 4), 20),
            session(3, days_ago(today, 1), 20),
            session(4, today, 20),
        ];
        assert_eq!(current_streak(&sessions, 1, today), 2);
    }

    #[test]
    fn streak_sums_minutes_per_day_before_applying_threshold() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, today, 10),
            session(2, today, 10),
            session(3, days_ago(today, 1), 15),
        ];
        assert_eq!(current_streak(&sessions, 20, today), 1);
        assert_eq!(current_streak(&sessions, 15, today), 2);
        assert_eq!(current_streak(&sessions, 25, today), 0);
    }

    #[test]
    fn streak_crosses_month_and_year_boundaries() {
        let today = date("2025-01-01");
        let sessions = vec![
            session(1, date("2024-12-30"), 5),
            session(2, date("2024-12-31"), 5),
            session(3, today, 5),
        ];
        assert_eq!(current_streak(&sessions, 1, today), 3);
    }

    #[test]
    fn future_session_breaks_the_streak() {
        let today = date("2024-06-12");
        let sessions = vec![session(1, today, 30), session(2, date("2024-06-14"), 30)];
        assert_eq!(current_streak(&sessions, 1, today), 0);
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-06-12 is a Wednesday
        assert_eq!(start_of_week(date("2024-06-12")), date("2024-06-09"));
        assert_eq!(start_of_week(date("2024-06-09")), date("2024-06-09"));
        assert_eq!(start_of_week(date("2024-06-15")), date("2024-06-09"));
    }

    #[test]
    fn weekly_progress_is_half_way() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, date("2024-06-08"), 300),
            session(2, date("2024-06-09"), 45),
            session(3, today, 60),
        ];
        let progress = weekly_progress(&sessions, 210, today);
        assert_eq!(
            progress,
            WeeklyProgress {
                minutes: 105,
                percentage: 50.0
            }
        );
    }

    #[test]
    fn weekly_progress_caps_at_one_hundred() {
        let today = date("2024-06-12");
        let sessions = vec![session(1, today, 500)];
        let progress = weekly_progress(&sessions, 210, today);
        assert_eq!(progress.minutes, 500);
        assert_eq!(progress.percentage, 100.0);
    }

    #[test]
    fn technique_usage_counts_sessions() {
        let today = date("2024-06-12");
        let techniques = default_techniques();
        let mut a = session(1, today, 30);
        a.techniques = vec![techniques[0].id, techniques[1].id];
        let mut b = session(2, today, 30);
        b.techniques = vec![techniques[0].id];
        let c = session(3, today, 30);
        let d = session(4, today, 30);

        let usage = technique_usage(&techniques, &[a, b, c, d]);
        assert_eq!(usage.len(), 5);
        assert_eq!(usage[0].name, "Scales");
        assert_eq!(usage[0].sessions, 2);
        assert_eq!(usage[0].share, 0.5);
        assert_eq!(usage[1].sessions, 1);
        assert_eq!(usage[1].share, 0.25);
        assert_eq!(usage[4].sessions, 0);
    }

    #[test]
    fn technique_usage_share_is_zero_without_sessions() {
        let usage = technique_usage(&default_techniques(), &[]);
        assert!(usage.iter().all(|u| u.sessions == 0 && u.share == 0.0));
    }

    #[test]
    fn recent_sessions_are_the_last_logged() {
        let today = date("2024-06-12");
        let sessions: Vec<Session> = (1..=7).map(|i| session(i, today, 10)).collect();
        let ids: Vec<u64> = recent_sessions(&sessions, RECENT_SESSIONS)
            .iter()
            .map(|s| s.id.value())
            .collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn newest_first_sorts_by_date_and_keeps_log_order_within_a_day() {
        let sessions = vec![
            session(1, date("2024-06-10"), 10),
            session(2, date("2024-06-12"), 10),
            session(3, date("2024-06-10"), 10),
            session(4, date("2024-06-11"), 10),
        ];
        let ids: Vec<u64> = sessions_newest_first(&sessions)
            .iter()
            .map(|s| s.id.value())
            .collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn daily_minutes_groups_by_date() {
        let sessions = vec![
            session(1, date("2024-06-10"), 10),
            session(2, date("2024-06-12"), 20),
            session(3, date("2024-06-10"), 5),
        ];
        assert_eq!(
            daily_minutes(&sessions),
            vec![(date("2024-06-12"), 20), (date("2024-06-10"), 15)]
        );
    }

    #[test]
    fn summary_bundles_dashboard_numbers() {
        let today = date("2024-06-12");
        let sessions = vec![
            session(1, days_ago(today, 30), 100),
            session(2, days_ago(today, 1), 20),
            session(3, today, 25),
        ];
        let s = summary(&sessions, &Settings::default(), today);
        assert_eq!(
            s,
            PracticeSummary {
                total_minutes: 145,
                sessions_last_week: 2,
                streak_days: 2,
            }
        );
    }
}
