use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Tunable rates behind progress, streak and weekly goal calculations.
///
/// Fields missing from a stored value fall back to their defaults one by one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Minutes of practice that raise a technique by one level
    pub level_up_minutes: u32,
    /// Minutes of practice that take a song from 0% to 100%
    pub song_completion_minutes: u32,
    /// Minimum minutes on a day for that day to count toward the streak
    pub streak_threshold: u32,
    pub goal_minutes_per_week: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level_up_minutes: 60,
            song_completion_minutes: 120,
            streak_threshold: 1,
            goal_minutes_per_week: 210,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SettingKey {
    LevelUpMinutes,
    SongCompletionMinutes,
    StreakThreshold,
    GoalMinutesPerWeek,
}

impl Settings {
    pub fn get(&self, key: SettingKey) -> u32 {
        match key {
            SettingKey::LevelUpMinutes => self.level_up_minutes,
            SettingKey::SongCompletionMinutes => self.song_completion_minutes,
            SettingKey::StreakThreshold => self.streak_threshold,
            SettingKey::GoalMinutesPerWeek => self.goal_minutes_per_week,
        }
    }

    /// Sets one value, raising anything below 1 to 1. Returns the stored value.
    pub fn set(&mut self, key: SettingKey, value: u32) -> u32 {
        let value = value.max(1);
        let slot = match key {
            SettingKey::LevelUpMinutes => &mut self.level_up_minutes,
            SettingKey::SongCompletionMinutes => &mut self.song_completion_minutes,
            SettingKey::StreakThreshold => &mut self.streak_threshold,
            SettingKey::GoalMinutesPerWeek => &mut self.goal_minutes_per_week,
        };
        *slot = value;
        value
    }

    /// Stored values may come from older data; a zero rate would divide by zero.
    pub fn sanitized(mut self) -> Self {
        for key in [
            SettingKey::LevelUpMinutes,
            SettingKey::SongCompletionMinutes,
            SettingKey::StreakThreshold,
            SettingKey::GoalMinutesPerWeek,
        ] {
            let current = self.get(key);
            self.set(key, current);
        }
        self
    }

    /// Technique levels gained for the given minutes.
    pub fn level_gain(&self, minutes: u32) -> f64 {
        minutes as f64 / self.level_up_minutes as f64
    }

    /// Song percentage gained for the given minutes.
    pub fn song_gain(&self, minutes: u32) -> f64 {
        minutes as f64 / self.song_completion_minutes as f64 * 100.0
    }

    pub fn overview(&self) -> SettingsOverview {
        SettingsOverview {
            levels_per_hour: self.level_gain(60),
            song_percent_per_hour: self.song_gain(60),
            daily_goal_minutes: (self.goal_minutes_per_week as f64 / 7.0).round() as u32,
        }
    }
}

/// What the current settings mean in practice terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsOverview {
    pub levels_per_hour: f64,
    pub song_percent_per_hour: f64,
    pub daily_goal_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_install() {
        let s = Settings::default();
        assert_eq!(s.level_up_minutes, 60);
        assert_eq!(s.song_completion_minutes, 120);
        assert_eq!(s.streak_threshold, 1);
        assert_eq!(s.goal_minutes_per_week, 210);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "levelUpMinutes": 60,
                "songCompletionMinutes": 120,
                "streakThreshold": 1,
                "goalMinutesPerWeek": 210
            })
        );
    }

    #[test]
    fn missing_fields_fall_back_individually() {
        let s: Settings = serde_json::from_str(r#"{"levelUpMinutes": 30}"#).unwrap();
        assert_eq!(s.level_up_minutes, 30);
        assert_eq!(s.song_completion_minutes, 120);
        assert_eq!(s.goal_minutes_per_week, 210);
    }

    #[test]
    fn set_raises_zero_to_one() {
        let mut s = Settings::default();
        assert_eq!(s.set(SettingKey::GoalMinutesPerWeek, 0), 1);
        assert_eq!(s.goal_minutes_per_week, 1);
        assert_eq!(s.set(SettingKey::StreakThreshold, 20), 20);
        assert_eq!(s.get(SettingKey::StreakThreshold), 20);
    }

    #[test]
    fn sanitized_repairs_zero_rates() {
        let s = Settings {
            level_up_minutes: 0,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.level_up_minutes, 1);
        assert_eq!(s.song_completion_minutes, 120);
    }

    #[test]
    fn overview_describes_hourly_rates() {
        let o = Settings::default().overview();
        assert_eq!(o.levels_per_hour, 1.0);
        assert_eq!(o.song_percent_per_hour, 50.0);
        assert_eq!(o.daily_goal_minutes, 30);
    }

    #[test]
    fn key_names_are_kebab_case() {
        assert_eq!(SettingKey::LevelUpMinutes.to_string(), "level-up-minutes");
        assert_eq!(
            SettingKey::GoalMinutesPerWeek.to_string(),
            "goal-minutes-per-week"
        );
    }
}
