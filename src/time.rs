//! Millisecond arithmetic: structured durations and their decomposition into
//! day/hour/minute/second/millisecond digits.

use std::fmt;

pub const MILLIS_PER_SECOND: u64 = 1_000;
pub const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Unit of a single time digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Extract the digit for this unit from a millisecond count.
    ///
    /// `6033` yields `6` for [`TimeUnit::Seconds`] and `33` for
    /// [`TimeUnit::Milliseconds`]. Days are not wrapped.
    pub fn digit(self, millis: u64) -> u64 {
        match self {
            TimeUnit::Milliseconds => millis % MILLIS_PER_SECOND,
            TimeUnit::Seconds => (millis / MILLIS_PER_SECOND) % 60,
            TimeUnit::Minutes => (millis / MILLIS_PER_MINUTE) % 60,
            TimeUnit::Hours => (millis / MILLIS_PER_HOUR) % 24,
            TimeUnit::Days => millis / MILLIS_PER_DAY,
        }
    }

    /// Same as [`TimeUnit::digit`], left-filled with `0` up to `width` characters
    pub fn digit_padded(self, millis: u64, width: usize) -> String {
        fill_left_zero(self.digit(millis), width)
    }
}

/// Left-pad the decimal representation of `value` with zeros.
///
/// Values already `width` digits or longer are returned untouched.
pub fn fill_left_zero(value: u64, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// A structured duration.
///
/// Used both as configuration input (every field optional, defaulting to 0)
/// and as the normalised decomposition of a millisecond count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimeSpec {
    pub milliseconds: u64,
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
    pub days: u64,
}

impl TimeSpec {
    pub const ZERO: TimeSpec = TimeSpec {
        milliseconds: 0,
        seconds: 0,
        minutes: 0,
        hours: 0,
        days: 0,
    };

    /// Decompose a millisecond count into normalised components
    pub fn from_millis(millis: u64) -> Self {
        TimeSpec {
            milliseconds: TimeUnit::Milliseconds.digit(millis),
            seconds: TimeUnit::Seconds.digit(millis),
            minutes: TimeUnit::Minutes.digit(millis),
            hours: TimeUnit::Hours.digit(millis),
            days: TimeUnit::Days.digit(millis),
        }
    }

    pub fn with_milliseconds(mut self, milliseconds: u64) -> Self {
        self.milliseconds = milliseconds;
        self
    }

    pub fn with_seconds(mut self, seconds: u64) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn with_minutes(mut self, minutes: u64) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_hours(mut self, hours: u64) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_days(mut self, days: u64) -> Self {
        self.days = days;
        self
    }

    /// Total milliseconds; saturates at `u64::MAX` instead of overflowing
    pub fn total_millis(&self) -> u64 {
        self.milliseconds
            .saturating_add(self.seconds.saturating_mul(MILLIS_PER_SECOND))
            .saturating_add(self.minutes.saturating_mul(MILLIS_PER_MINUTE))
            .saturating_add(self.hours.saturating_mul(MILLIS_PER_HOUR))
            .saturating_add(self.days.saturating_mul(MILLIS_PER_DAY))
    }

    pub fn get(&self, unit: TimeUnit) -> u64 {
        match unit {
            TimeUnit::Milliseconds => self.milliseconds,
            TimeUnit::Seconds => self.seconds,
            TimeUnit::Minutes => self.minutes,
            TimeUnit::Hours => self.hours,
            TimeUnit::Days => self.days,
        }
    }

    pub fn padded(&self, unit: TimeUnit, width: usize) -> String {
        fill_left_zero(self.get(unit), width)
    }
}

impl From<std::time::Duration> for TimeSpec {
    fn from(duration: std::time::Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        TimeSpec::from_millis(millis)
    }
}

/// `days, HH:MM:SS:mmm`
impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:02}:{:02}:{:02}:{:03}",
            self.days, self.hours, self.minutes, self.seconds, self.milliseconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_decomposes_to_zero_digits() {
        let spec = TimeSpec::from_millis(0);
        assert_eq!(spec, TimeSpec::ZERO);
        assert_eq!(TimeUnit::Milliseconds.digit_padded(0, 3), "000");
    }

    #[test]
    fn test_decompose_known_value() {
        let spec = TimeSpec::from_millis(446_582_010);
        assert_eq!(spec.days, 5);
        assert_eq!(spec.hours, 4);
        assert_eq!(spec.minutes, 3);
        assert_eq!(spec.seconds, 2);
        assert_eq!(spec.milliseconds, 10);

        assert_eq!(spec.padded(TimeUnit::Seconds, 2), "02");
        assert_eq!(spec.padded(TimeUnit::Minutes, 2), "03");
        assert_eq!(spec.padded(TimeUnit::Hours, 2), "04");
        assert_eq!(spec.padded(TimeUnit::Milliseconds, 3), "010");
    }

    #[test]
    fn test_structured_duration_total() {
        let spec = TimeSpec::default()
            .with_days(2)
            .with_hours(5)
            .with_minutes(3)
            .with_seconds(10);
        assert_eq!(spec.total_millis(), 190_990_000);

        // only milliseconds set
        assert_eq!(TimeSpec::default().with_milliseconds(42).total_millis(), 42);
    }

    #[test]
    fn test_decomposition_reconstructs_original() {
        let samples = [
            0,
            1,
            999,
            1_000,
            59_999,
            3_599_999,
            86_399_999,
            86_400_000,
            446_582_010,
            1_234_567_890_123,
        ];
        for millis in samples {
            assert_eq!(TimeSpec::from_millis(millis).total_millis(), millis, "{millis}");
        }
    }

    #[test]
    fn test_fill_left_zero_never_truncates() {
        assert_eq!(fill_left_zero(7, 2), "07");
        assert_eq!(fill_left_zero(7, 0), "7");
        assert_eq!(fill_left_zero(12345, 3), "12345");
        assert_eq!(fill_left_zero(123, 3).len(), 3);
    }

    #[test]
    fn test_total_millis_saturates() {
        let spec = TimeSpec::default().with_days(u64::MAX);
        assert_eq!(spec.total_millis(), u64::MAX);
    }

    #[test]
    fn test_display_format() {
        let spec = TimeSpec::from_millis(446_582_010);
        assert_eq!(spec.to_string(), "5, 04:03:02:010");
    }
}
