//! Timer options and their resolution into a concrete counting plan

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::TimerError;
use crate::time::TimeSpec;

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_NAME: &str = "untitled";

/// Counting direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Elapsed time, counting from zero towards the target
    #[default]
    Up,
    /// Remaining time, counting from the target towards zero
    Down,
}

/// Explicit stop target for an up-count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAt {
    /// Finish once this much time has been counted
    After(TimeSpec),
    /// Never finish
    Never,
}

/// User-facing timer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TimerOptions {
    /// Structured span to count (down from it, or up to it)
    pub start_from: Option<TimeSpec>,
    /// Explicit stop target; only valid for up-counts
    pub stop_at: Option<StopAt>,
    /// Calendar target; picks the direction on its own
    pub date: Option<DateTime<Utc>>,
    /// Tick period
    pub update_interval: Duration,
    /// Counting direction; ignored when `date` is set
    pub direction: Option<Direction>,
    /// Display label
    pub name: String,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            start_from: None,
            stop_at: None,
            date: None,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            direction: None,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl TimerOptions {
    /// Count down from `span` to zero
    pub fn count_down(span: TimeSpec) -> Self {
        Self::default()
            .with_start_from(span)
            .with_direction(Direction::Down)
    }

    /// Count up from zero to `span`
    pub fn count_up(span: TimeSpec) -> Self {
        Self::default()
            .with_start_from(span)
            .with_direction(Direction::Up)
    }

    /// Count up from zero without ever finishing
    pub fn stopwatch() -> Self {
        Self::default().with_stop_at(StopAt::Never)
    }

    /// Count towards (future) or away from (past) a calendar date
    pub fn until(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_start_from(mut self, span: TimeSpec) -> Self {
        self.start_from = Some(span);
        self
    }

    pub fn with_stop_at(mut self, stop_at: StopAt) -> Self {
        self.stop_at = Some(stop_at);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validate the options and resolve them into a [`CountPlan`].
    ///
    /// `now` anchors date targets: the direction and total for a date are
    /// fixed here, not when the timer starts.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<CountPlan, TimerError> {
        if self.update_interval.is_zero() {
            return Err(TimerError::InvalidInterval);
        }

        let (direction, total) = match (self.date, self.start_from, self.stop_at) {
            (None, None, None) => return Err(TimerError::MissingCountSpec),
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(TimerError::AmbiguousCountSpec(
                    "date cannot be combined with start_from or stop_at",
                ))
            }
            (None, Some(_), Some(_)) => {
                return Err(TimerError::AmbiguousCountSpec(
                    "start_from and stop_at are mutually exclusive",
                ))
            }
            (Some(date), None, None) => {
                let delta = (date - now).num_milliseconds();
                if self.direction.is_some() {
                    log::debug!(
                        "Timer '{}' ignores the configured direction, date target decides it",
                        self.name
                    );
                }
                let direction = if date > now {
                    Direction::Down
                } else {
                    Direction::Up
                };
                (direction, Some(delta.unsigned_abs()))
            }
            (None, Some(span), None) => match self.direction {
                Some(direction) => (direction, Some(span.total_millis())),
                None => return Err(TimerError::MissingDirection),
            },
            (None, None, Some(stop_at)) => {
                if self.direction == Some(Direction::Down) {
                    return Err(TimerError::AmbiguousCountSpec(
                        "stop_at only applies when counting up",
                    ));
                }
                match stop_at {
                    StopAt::After(span) => (Direction::Up, Some(span.total_millis())),
                    StopAt::Never => (Direction::Up, None),
                }
            }
        };

        Ok(CountPlan {
            name: self.name.clone(),
            direction,
            total,
            update_interval: self.update_interval,
        })
    }
}

/// Validated, fully resolved counting parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountPlan {
    pub name: String,
    pub direction: Direction,
    /// Milliseconds to count; `None` is an open-ended up-count
    pub total: Option<u64>,
    pub update_interval: Duration,
}

impl CountPlan {
    /// Value published when a fresh session starts
    pub fn millis_at_start(&self) -> u64 {
        match self.direction {
            Direction::Down => self.total.unwrap_or(0),
            Direction::Up => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tokio_test::{assert_err, assert_ok};

    fn ten_seconds() -> TimeSpec {
        TimeSpec::default().with_seconds(10)
    }

    #[test]
    fn test_defaults() {
        let options = TimerOptions::default();
        assert_eq!(options.update_interval, Duration::from_millis(1000));
        assert_eq!(options.name, "untitled");
        assert_eq!(options.direction, None);
        assert_eq!(Direction::default(), Direction::Up);
    }

    #[test]
    fn test_count_down_plan() {
        let plan = assert_ok!(TimerOptions::count_down(ten_seconds())
            .with_name("tea")
            .resolve(Utc::now()));
        assert_eq!(plan.direction, Direction::Down);
        assert_eq!(plan.total, Some(10_000));
        assert_eq!(plan.millis_at_start(), 10_000);
        assert_eq!(plan.name, "tea");
    }

    #[test]
    fn test_count_up_plan() {
        let plan = assert_ok!(TimerOptions::count_up(ten_seconds()).resolve(Utc::now()));
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(plan.total, Some(10_000));
        assert_eq!(plan.millis_at_start(), 0);
    }

    #[test]
    fn test_stop_at_defaults_to_up() {
        let plan = assert_ok!(TimerOptions::default()
            .with_stop_at(StopAt::After(ten_seconds()))
            .resolve(Utc::now()));
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(plan.total, Some(10_000));

        let plan = assert_ok!(TimerOptions::stopwatch().resolve(Utc::now()));
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(plan.total, None);
    }

    #[test]
    fn test_future_date_counts_down() {
        let now = Utc::now();
        let plan = assert_ok!(TimerOptions::until(now + TimeDelta::seconds(90))
            .with_direction(Direction::Up)
            .resolve(now));
        assert_eq!(plan.direction, Direction::Down);
        assert_eq!(plan.total, Some(90_000));
    }

    #[test]
    fn test_past_date_counts_up() {
        let now = Utc::now();
        let plan = assert_ok!(TimerOptions::until(now - TimeDelta::minutes(2)).resolve(now));
        assert_eq!(plan.direction, Direction::Up);
        assert_eq!(plan.total, Some(120_000));
    }

    #[test]
    fn test_missing_count_spec() {
        let err = assert_err!(TimerOptions::default().resolve(Utc::now()));
        assert_eq!(err, TimerError::MissingCountSpec);
    }

    #[test]
    fn test_ambiguous_count_specs() {
        let now = Utc::now();
        let with_date = TimerOptions::until(now).with_start_from(ten_seconds());
        assert!(matches!(
            with_date.resolve(now),
            Err(TimerError::AmbiguousCountSpec(_))
        ));

        let both_spans = TimerOptions::count_up(ten_seconds()).with_stop_at(StopAt::Never);
        assert!(matches!(
            both_spans.resolve(now),
            Err(TimerError::AmbiguousCountSpec(_))
        ));

        let down_with_stop = TimerOptions::default()
            .with_stop_at(StopAt::After(ten_seconds()))
            .with_direction(Direction::Down);
        assert!(matches!(
            down_with_stop.resolve(now),
            Err(TimerError::AmbiguousCountSpec(_))
        ));
    }

    #[test]
    fn test_open_ended_span_needs_direction() {
        let options = TimerOptions::default().with_start_from(ten_seconds());
        assert_eq!(options.resolve(Utc::now()), Err(TimerError::MissingDirection));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let options =
            TimerOptions::count_down(ten_seconds()).with_update_interval(Duration::ZERO);
        assert_eq!(options.resolve(Utc::now()), Err(TimerError::InvalidInterval));
    }
}
