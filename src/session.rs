//! Counting engine
//!
//! A session derives every value from the wall-clock time elapsed since its
//! anchor, never from the previous value plus the nominal period, so
//! scheduler jitter cannot accumulate into drift.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{CountPlan, Direction};
use crate::ticker::{Scheduler, Ticker};

/// Value computed for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Milliseconds elapsed (up) or remaining (down); never negative
    pub value: u64,
    /// The session reached its target with this value
    pub finished: bool,
}

/// Elapsed/remaining time for one counting session
pub struct CountingSession {
    direction: Direction,
    /// Up-count finish target, `None` when open-ended
    target: Option<u64>,
    period: Duration,
    anchor: Instant,
    total_to_go: u64,
    continuation_offset: u64,
    continue_point: u64,
    ticker: Option<Box<dyn Ticker>>,
}

impl CountingSession {
    pub fn new(plan: &CountPlan) -> Self {
        Self {
            direction: plan.direction,
            target: plan.total,
            period: plan.update_interval,
            anchor: Instant::now(),
            total_to_go: 0,
            continuation_offset: 0,
            continue_point: plan.millis_at_start(),
            ticker: None,
        }
    }

    /// Start (or resume) counting from `anchor`.
    ///
    /// Any active ticker is cancelled first. A fresh start returns the
    /// initial value to publish right away; a resumed one keeps the current
    /// continue point and returns `None`.
    pub fn begin(
        &mut self,
        scheduler: &dyn Scheduler,
        anchor: Instant,
        total_to_go: u64,
        resumed: bool,
    ) -> Option<Tick> {
        self.cancel();

        self.anchor = anchor;
        self.total_to_go = total_to_go;
        self.continuation_offset = if resumed { self.continue_point } else { 0 };
        self.ticker = Some(scheduler.schedule(anchor + self.period, self.period));

        if resumed {
            return None;
        }

        self.continue_point = match self.direction {
            Direction::Down => total_to_go,
            Direction::Up => 0,
        };
        Some(self.settle(self.continue_point))
    }

    /// Compute the value for `now` and update the continue point.
    ///
    /// Cancels the ticker when the session finishes.
    pub fn advance(&mut self, now: Instant) -> Tick {
        let value = self.value_at(now);
        self.continue_point = value;
        self.settle(value)
    }

    fn value_at(&self, now: Instant) -> u64 {
        let passed = millis(now.saturating_duration_since(self.anchor));
        match self.direction {
            Direction::Down => self.total_to_go.saturating_sub(passed),
            Direction::Up => passed.saturating_add(self.continuation_offset),
        }
    }

    fn settle(&mut self, value: u64) -> Tick {
        let finished = match self.direction {
            Direction::Down => value == 0,
            Direction::Up => self.target.is_some_and(|target| value >= target),
        };
        if finished {
            self.cancel();
        }
        Tick { value, finished }
    }

    /// Cancel the ticker and record the value reached at `now` as the
    /// continue point, without evaluating completion
    pub fn suspend(&mut self, now: Instant) -> u64 {
        if self.is_active() {
            self.continue_point = self.value_at(now);
        }
        self.cancel();
        self.continue_point
    }

    /// Drop the active ticker, if any
    pub fn cancel(&mut self) {
        self.ticker = None;
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn continue_point(&self) -> u64 {
        self.continue_point
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Wait for the next tick; pending forever while no ticker is active
    pub async fn next_tick(&mut self) -> Instant {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.tick().await,
            None => std::future::pending().await,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
