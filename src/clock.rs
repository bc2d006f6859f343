use chrono::{Days, Local, NaiveDate};

/// Source of "today" for statistics and new drafts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Local calendar date of the machine
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn fixed(today: NaiveDate) -> Self {
        Self::Fixed(today)
    }

    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(d) => *d,
        }
    }

    /// Moves a fixed clock forward. No effect on the system clock.
    pub fn advance_days(&mut self, days: u64) {
        if let Clock::Fixed(d) = self {
            *d = *d + Days::new(days);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_date() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let mut clock = Clock::fixed(day);
        assert_eq!(clock.today(), day);
        clock.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::System;
        clock.advance_days(10);
        assert_eq!(clock, Clock::System);
    }
}
