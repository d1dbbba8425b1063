//! # Count Timer
//!
//! An embeddable count-up/countdown timer for live "time left" and "time
//! elapsed" displays, built on top of Tokio.
//!
//! Each timer runs as its own task, computes the current value from the
//! wall-clock time elapsed since it was started (or resumed), and reports it
//! through a callback on every tick.
//!
//! ## Features
//!
//! - **Up and down counting**: from a structured duration, an explicit stop
//!   target, or a calendar date
//! - **Suspend/resume**: resuming continues from where the count was suspended
//! - **Threshold notifications**: callbacks at offsets before the end or after
//!   the start, each firing at most once per start
//! - **Lifecycle notifications**: start, suspend, resume and finish, as
//!   callbacks and as events on a bounded channel
//! - **Graceful Shutdown**: cancellation tokens and shutdown commands
//!
//! ## Quick Start
//!
//! ```rust
//! use count_timer::{CancellationToken, LifecycleEvent, NotifySpec, TimeSpec, Timer, TimerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = TimerOptions::count_down(TimeSpec::default().with_milliseconds(300))
//!         .with_update_interval(std::time::Duration::from_millis(100))
//!         .with_name("tea");
//!
//!     let (timer, mut handle) = Timer::with_options(options, 16, 16, CancellationToken::new())?;
//!     tokio::spawn(timer.run());
//!
//!     handle
//!         .notify_at(NotifySpec::on(LifecycleEvent::Finish), |_, ms| {
//!             println!("done at {} ms", ms);
//!         })
//!         .await?;
//!
//!     handle
//!         .start(|result| println!("{} left", result))
//!         .await?;
//!
//!     // Wait for the finish event
//!     while let Some(event) = handle.recv_event().await {
//!         if let count_timer::TimerEvent::Lifecycle { event: LifecycleEvent::Finish, .. } = event {
//!             break;
//!         }
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod notifier;
mod result;
mod session;
mod ticker;
mod time;
mod tm;

pub use config::{CountPlan, Direction, StopAt, TimerOptions, DEFAULT_NAME, DEFAULT_UPDATE_INTERVAL};
pub use error::TimerError;
pub use notifier::{
    Anchor, LifecycleEvent, NotifyCallback, NotifySpec, SubscriptionId, ThresholdNotifier,
};
pub use result::CountResult;
pub use session::{CountingSession, Tick};
pub use ticker::{IntervalScheduler, Scheduler, Ticker};
pub use time::{fill_left_zero, TimeSpec, TimeUnit};
pub use tm::{
    IntervalCallback, Timer, TimerCommand, TimerControl, TimerEvent, TimerHandle, TimerState,
    TimerStatus,
};

// Re-export commonly used types for convenience
pub use std::time::Duration;
pub use tokio_util::sync::CancellationToken;
