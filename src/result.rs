use std::fmt;

use crate::config::Direction;
use crate::time::{TimeSpec, TimeUnit};

/// Snapshot of a timer's current value, handed to the interval callback.
///
/// Refreshed on every tick; clone it if you need to keep it around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountResult {
    name: String,
    direction: Direction,
    milliseconds: u64,
    time: TimeSpec,
}

impl CountResult {
    pub(crate) fn new(name: String, direction: Direction) -> Self {
        Self {
            name,
            direction,
            milliseconds: 0,
            time: TimeSpec::ZERO,
        }
    }

    pub(crate) fn update(&mut self, milliseconds: u64) {
        self.milliseconds = milliseconds;
        self.time = TimeSpec::from_millis(milliseconds);
    }

    /// Timer name from the options
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Milliseconds elapsed (up) or left (down)
    pub fn milliseconds(&self) -> u64 {
        self.milliseconds
    }

    /// Decomposed view of [`CountResult::milliseconds`]
    pub fn time(&self) -> &TimeSpec {
        &self.time
    }

    pub fn days(&self) -> u64 {
        self.time.days
    }

    pub fn hours(&self) -> u64 {
        self.time.hours
    }

    pub fn minutes(&self) -> u64 {
        self.time.minutes
    }

    pub fn seconds(&self) -> u64 {
        self.time.seconds
    }

    pub fn millis_digit(&self) -> u64 {
        self.time.milliseconds
    }

    /// Digit for `unit`, left-filled with zeros up to `width`
    pub fn padded(&self, unit: TimeUnit, width: usize) -> String {
        self.time.padded(unit, width)
    }
}

impl fmt::Display for CountResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.time, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_refreshes_decomposition() {
        let mut result = CountResult::new("untitled".to_string(), Direction::Down);
        assert_eq!(result.milliseconds(), 0);

        result.update(446_582_010);
        assert_eq!(result.milliseconds(), 446_582_010);
        assert_eq!(result.days(), 5);
        assert_eq!(result.hours(), 4);
        assert_eq!(result.minutes(), 3);
        assert_eq!(result.seconds(), 2);
        assert_eq!(result.millis_digit(), 10);
        assert_eq!(result.padded(TimeUnit::Milliseconds, 3), "010");
        assert_eq!(result.to_string(), "5, 04:03:02:010");

        result.update(1_500);
        assert_eq!(result.seconds(), 1);
        assert_eq!(result.millis_digit(), 500);
        assert_eq!(result.days(), 0);
    }
}
