//! Simulation calendar
//!
//! Maps the simulation clock (hours since the start of day 0) onto day
//! indices and weekdays. Trucks only arrive on operating days; processing
//! continues every day.

use chrono::Weekday;
use tracing::debug;

use crate::types::{calendar::HOURS_PER_DAY, SimulationConfig};

/// Day and weekday bookkeeping for the plant clock
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    start_weekday: Weekday,
    non_operating: Vec<Weekday>,
}

impl Calendar {
    /// Create a calendar starting on `start_weekday`
    pub fn new(start_weekday: Weekday, non_operating: Vec<Weekday>) -> Self {
        debug!(start = %start_weekday, closed = ?non_operating, "Calendar created");
        Self { start_weekday, non_operating }
    }

    /// Calendar described by the configuration
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.start_weekday, config.non_operating_weekdays.clone())
    }

    /// Zero-based day containing `clock`
    pub fn day_index(&self, clock: f64) -> u32 {
        (clock.max(0.0) / HOURS_PER_DAY).floor() as u32
    }

    /// Start of the day containing `clock`
    pub fn day_start(&self, clock: f64) -> f64 {
        f64::from(self.day_index(clock)) * HOURS_PER_DAY
    }

    /// Start of the day after the one containing `clock`
    pub fn next_day_start(&self, clock: f64) -> f64 {
        self.day_start(clock) + HOURS_PER_DAY
    }

    /// Weekday of a day index
    pub fn weekday(&self, day: u32) -> Weekday {
        (0..day % 7).fold(self.start_weekday, |weekday, _| weekday.succ())
    }

    /// Whether trucks arrive on this day
    pub fn is_operating_day(&self, day: u32) -> bool {
        !self.non_operating.contains(&self.weekday(day))
    }

    /// Number of operating days among the first `days`
    pub fn operating_days(&self, days: u32) -> u32 {
        (0..days).filter(|day| self.is_operating_day(*day)).count() as u32
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Weekday::Mon, vec![Weekday::Sun])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_boundaries() {
        let calendar = Calendar::default();

        assert_eq!(calendar.day_index(0.0), 0);
        assert_eq!(calendar.day_index(23.99), 0);
        assert_eq!(calendar.day_index(24.0), 1);
        assert_eq!(calendar.day_start(37.5), 24.0);
        assert_eq!(calendar.next_day_start(0.0), 24.0);
        assert_eq!(calendar.next_day_start(47.2), 48.0);
    }

    #[test]
    fn test_weekdays_and_operating_days() {
        let calendar = Calendar::default();

        assert_eq!(calendar.weekday(0), Weekday::Mon);
        assert_eq!(calendar.weekday(6), Weekday::Sun);
        assert_eq!(calendar.weekday(7), Weekday::Mon);
        assert!(calendar.is_operating_day(5));
        assert!(!calendar.is_operating_day(6));
        assert!(!calendar.is_operating_day(13));
        assert_eq!(calendar.operating_days(13), 12);
    }

    #[test]
    fn test_custom_start_weekday() {
        let calendar = Calendar::new(Weekday::Sat, vec![Weekday::Sat, Weekday::Sun]);
        assert!(!calendar.is_operating_day(0));
        assert!(!calendar.is_operating_day(1));
        assert!(calendar.is_operating_day(2));
        assert_eq!(calendar.weekday(2), Weekday::Mon);
    }
}
