use thiserror::Error;

/// Errors surfaced by timer configuration and control.
///
/// All of them are usage errors the caller can recover from; none of them
/// leave a half-started tick loop behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start` was requested before any options were configured
    #[error("timer has no options configured; call set_options before start")]
    MissingOptions,

    /// Neither a structured duration nor a calendar date was given
    #[error("no count specified: provide start_from, stop_at or date")]
    MissingCountSpec,

    /// More than one count source was given, or they contradict each other
    #[error("ambiguous count specification: {0}")]
    AmbiguousCountSpec(&'static str),

    /// A structured duration without a stop target needs an explicit direction
    #[error("start_from without stop_at requires an explicit direction")]
    MissingDirection,

    /// No per-tick callback was supplied and none is stored from an earlier start
    #[error("no interval callback supplied")]
    MissingIntervalCallback,

    /// The update interval must be greater than zero
    #[error("update interval must be greater than zero")]
    InvalidInterval,

    /// The command channel is full (non-blocking send)
    #[error("timer command queue is full")]
    CommandQueueFull,

    /// The timer task is no longer running
    #[error("timer task is not running")]
    Closed,
}
