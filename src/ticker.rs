//! Recurring tick sources
//!
//! A [`Scheduler`] hands out one [`Ticker`] per counting segment. Dropping the
//! ticker cancels it. The default implementation is backed by
//! [`tokio::time::interval_at`], so paused-clock tests drive it through
//! `tokio::time::advance`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A recurring tick handle
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick and return the instant it was scheduled for
    async fn tick(&mut self) -> Instant;
}

/// Creates tickers for counting sessions
pub trait Scheduler: Send {
    /// Schedule ticks every `period`, the first one at `first_tick`
    fn schedule(&self, first_tick: Instant, period: Duration) -> Box<dyn Ticker>;
}

/// [`Scheduler`] backed by tokio intervals
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl Scheduler for IntervalScheduler {
    fn schedule(&self, first_tick: Instant, period: Duration) -> Box<dyn Ticker> {
        let mut interval = interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Box::new(IntervalTicker { interval })
    }
}

struct IntervalTicker {
    interval: Interval,
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> Instant {
        self.interval.tick().await;
        // report the actual wake-up time, values derive from wall time
        Instant::now()
    }
}
