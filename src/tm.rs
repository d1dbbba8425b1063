use std::fmt;
use std::ops::Deref;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{CountPlan, Direction, TimerOptions};
use crate::error::TimerError;
use crate::notifier::{
    LifecycleEvent, NotifyCallback, NotifySpec, SubscriptionId, ThresholdNotifier,
};
use crate::result::CountResult;
use crate::session::{CountingSession, Tick};
use crate::ticker::{IntervalScheduler, Scheduler};

/// Callback invoked on every tick and once right after a fresh start
pub type IntervalCallback = Box<dyn FnMut(&CountResult) + Send + 'static>;

type Reply<T> = oneshot::Sender<Result<T, TimerError>>;

/// Count timer driven by its own task
pub struct Timer {
    /// Instance name for logging, taken from the options
    name: String,

    /// Channel for receiving timer commands
    command_rx: mpsc::Receiver<TimerCommand>,

    /// Weak side of the command channel, handed to callbacks as their owner
    command_tx: mpsc::WeakSender<TimerCommand>,

    /// Channel for sending timer events
    event_tx: mpsc::Sender<TimerEvent>,

    plan: Option<CountPlan>,
    state: TimerState,
    session: Option<CountingSession>,
    scheduler: Box<dyn Scheduler>,
    on_interval: Option<IntervalCallback>,
    notifier: ThresholdNotifier<TimerControl>,
    result: CountResult,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,
}

/// Cloneable sender for timer commands.
///
/// This is also the owner reference passed to notification callbacks; its
/// non-blocking `try_*` methods are safe to call from inside any callback.
#[derive(Clone)]
pub struct TimerControl {
    command_tx: mpsc::Sender<TimerCommand>,
}

/// Handle for controlling the timer and receiving its events
pub struct TimerHandle {
    control: TimerControl,

    /// Channel for receiving timer events
    event_rx: mpsc::Receiver<TimerEvent>,
}

/// Timer lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimerState {
    #[default]
    NotStarted,
    Counting,
    Suspended,
    /// Reached its target; only `start` leaves this state
    Finished,
}

/// Point-in-time view of a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStatus {
    pub name: String,
    pub state: TimerState,
    /// Last elapsed (up) or remaining (down) milliseconds
    pub milliseconds: u64,
}

/// Timer command enum
pub enum TimerCommand {
    Configure(CountPlan),
    Start {
        on_interval: Option<IntervalCallback>,
        reply: Option<Reply<()>>,
    },
    Suspend,
    Resume,
    Subscribe {
        spec: NotifySpec,
        callback: NotifyCallback<TimerControl>,
        reply: Option<oneshot::Sender<SubscriptionId>>,
    },
    Status {
        reply: oneshot::Sender<TimerStatus>,
    },
    Shutdown,
}

impl fmt::Debug for TimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerCommand::Configure(plan) => f.debug_tuple("Configure").field(plan).finish(),
            TimerCommand::Start { on_interval, .. } => f
                .debug_struct("Start")
                .field("on_interval", &on_interval.is_some())
                .finish_non_exhaustive(),
            TimerCommand::Suspend => f.write_str("Suspend"),
            TimerCommand::Resume => f.write_str("Resume"),
            TimerCommand::Subscribe { spec, .. } => f
                .debug_struct("Subscribe")
                .field("spec", spec)
                .finish_non_exhaustive(),
            TimerCommand::Status { .. } => f.write_str("Status"),
            TimerCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Timer event enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Lifecycle {
        name: String,
        event: LifecycleEvent,
        milliseconds: u64,
    },
    ThresholdReached {
        name: String,
        id: SubscriptionId,
        milliseconds: u64,
    },
}

impl Timer {
    /// Create an unconfigured Timer with bounded channels
    ///
    /// # Arguments
    /// * `command_buffer_size` - Size of command channel buffer
    /// * `event_buffer_size` - Size of event channel buffer
    /// * `cancel_token` - Stops the timer task when cancelled
    ///
    /// Returns (Timer, TimerHandle)
    pub fn new(
        command_buffer_size: usize,
        event_buffer_size: usize,
        cancel_token: CancellationToken,
    ) -> (Self, TimerHandle) {
        let (command_tx, command_rx) = mpsc::channel(command_buffer_size);
        let (event_tx, event_rx) = mpsc::channel(event_buffer_size);

        let timer = Timer {
            name: crate::config::DEFAULT_NAME.to_string(),
            command_rx,
            command_tx: command_tx.downgrade(),
            event_tx,
            plan: None,
            state: TimerState::NotStarted,
            session: None,
            scheduler: Box::new(IntervalScheduler),
            on_interval: None,
            notifier: ThresholdNotifier::new(),
            result: CountResult::new(crate::config::DEFAULT_NAME.to_string(), Direction::default()),
            cancel_token,
        };

        let handle = TimerHandle {
            control: TimerControl { command_tx },
            event_rx,
        };

        (timer, handle)
    }

    /// Create a Timer configured with `options`
    pub fn with_options(
        options: TimerOptions,
        command_buffer_size: usize,
        event_buffer_size: usize,
        cancel_token: CancellationToken,
    ) -> Result<(Self, TimerHandle), TimerError> {
        let plan = options.resolve(Utc::now())?;
        let (mut timer, handle) = Timer::new(command_buffer_size, event_buffer_size, cancel_token);
        timer.configure(plan);
        Ok((timer, handle))
    }

    /// Replace the tick source, e.g. with a manually driven one in tests
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    /// Run the timer
    pub async fn run(mut self) {
        log::info!("Timer '{}' task started", self.name);

        loop {
            tokio::select! {
                // commands first: a suspend issued during a tick wins over the next tick
                biased;

                // Handle cancellation token
                _ = self.cancel_token.cancelled() => {
                    log::info!("Timer '{}' cancelled via token", self.name);
                    break;
                },

                // Handle incoming commands
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command) {
                            log::info!("Timer '{}' shutting down", self.name);
                            break;
                        }
                    }
                    None => {
                        log::info!("Timer '{}' shutting down - all senders dropped", self.name);
                        break;
                    }
                },

                // Tick of the active session
                now = next_tick(&mut self.session) => {
                    self.on_tick(now);
                },
            }
        }

        if let Some(session) = self.session.as_mut() {
            session.cancel();
        }
        log::info!("Timer '{}' stopped", self.name);
    }

    /// Handle timer commands
    fn handle_command(&mut self, command: TimerCommand) -> bool {
        let mut shutdown = false;
        match command {
            TimerCommand::Configure(plan) => self.configure(plan),
            TimerCommand::Start { on_interval, reply } => {
                let result = self.start(on_interval);
                if let Err(e) = &result {
                    log::warn!("Timer '{}' cannot start: {}", self.name, e);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            TimerCommand::Suspend => self.suspend(),
            TimerCommand::Resume => self.resume(),
            TimerCommand::Subscribe {
                spec,
                callback,
                reply,
            } => {
                let id = self.notify_at(spec, callback);
                if let Some(reply) = reply {
                    let _ = reply.send(id);
                }
            }
            TimerCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            TimerCommand::Shutdown => {
                shutdown = true;
            }
        }
        shutdown
    }

    fn configure(&mut self, plan: CountPlan) {
        if self.state == TimerState::Counting {
            log::debug!(
                "Timer '{}' reconfigured while counting, applies on next start",
                self.name
            );
        }
        log::debug!(
            "Timer '{}' configured: {:?} {:?} ms as '{}', every {:?}",
            self.name,
            plan.direction,
            plan.total,
            plan.name,
            plan.update_interval
        );
        self.name = plan.name.clone();
        self.plan = Some(plan);
    }

    /// Begin a fresh session from the configured total
    fn start(&mut self, on_interval: Option<IntervalCallback>) -> Result<(), TimerError> {
        let plan = self.plan.clone().ok_or(TimerError::MissingOptions)?;
        if let Some(on_interval) = on_interval {
            self.on_interval = Some(on_interval);
        }
        if self.on_interval.is_none() {
            return Err(TimerError::MissingIntervalCallback);
        }

        // clean restart: the old session's ticker goes first
        if let Some(session) = self.session.as_mut() {
            session.cancel();
        }
        self.notifier.reset();
        self.notifier.set_starting_point(plan.total);
        self.result = CountResult::new(plan.name.clone(), plan.direction);

        let millis_at_start = plan.millis_at_start();
        log::info!(
            "Timer '{}' counting {:?} from {} ms",
            self.name,
            plan.direction,
            millis_at_start
        );
        self.state = TimerState::Counting;
        self.fire(LifecycleEvent::Start, millis_at_start);

        let mut session = CountingSession::new(&plan);
        let initial = session.begin(
            self.scheduler.as_ref(),
            Instant::now(),
            plan.total.unwrap_or(0),
            false,
        );
        self.session = Some(session);

        if let Some(tick) = initial {
            self.publish(tick);
        }
        Ok(())
    }

    fn suspend(&mut self) {
        match self.state {
            TimerState::Counting => {
                let continue_point = match self.session.as_mut() {
                    Some(session) => session.suspend(Instant::now()),
                    None => 0,
                };
                self.state = TimerState::Suspended;
                log::info!("Timer '{}' suspended at {} ms", self.name, continue_point);
                self.fire(LifecycleEvent::Suspend, continue_point);
            }
            TimerState::Finished => {
                log::debug!("Timer '{}' already finished, suspend ignored", self.name);
            }
            TimerState::NotStarted | TimerState::Suspended => {
                if let Some(session) = self.session.as_mut() {
                    session.cancel();
                }
                self.state = TimerState::Suspended;
            }
        }
    }

    fn resume(&mut self) {
        if self.state != TimerState::Suspended || self.on_interval.is_none() {
            log::debug!(
                "Timer '{}' is {:?}, resume ignored",
                self.name,
                self.state
            );
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let continue_point = session.continue_point();
        session.begin(self.scheduler.as_ref(), Instant::now(), continue_point, true);
        self.state = TimerState::Counting;
        log::info!("Timer '{}' resumed at {} ms", self.name, continue_point);
        self.fire(LifecycleEvent::Resume, continue_point);
    }

    fn notify_at(
        &mut self,
        spec: NotifySpec,
        callback: NotifyCallback<TimerControl>,
    ) -> SubscriptionId {
        let direction = self
            .plan
            .as_ref()
            .map_or(Direction::default(), |plan| plan.direction);
        let id = self.notifier.subscribe(spec, direction, callback);
        log::debug!(
            "Timer '{}' subscription {:?} added for {:?} ({:?})",
            self.name,
            id,
            spec,
            direction
        );
        id
    }

    fn status(&self) -> TimerStatus {
        TimerStatus {
            name: self.name.clone(),
            state: self.state,
            milliseconds: self
                .session
                .as_ref()
                .map_or(0, CountingSession::continue_point),
        }
    }

    fn on_tick(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let tick = session.advance(now);
        self.publish(tick);
    }

    /// Publish one value: interval callback, thresholds, then completion
    fn publish(&mut self, tick: Tick) {
        self.result.update(tick.value);
        if let Some(on_interval) = self.on_interval.as_mut() {
            on_interval(&self.result);
        }

        if let Some(control) = self.control() {
            let direction = self.result.direction();
            for id in self.notifier.evaluate(&control, direction, tick.value) {
                self.emit(TimerEvent::ThresholdReached {
                    name: self.name.clone(),
                    id,
                    milliseconds: tick.value,
                });
            }
        }

        if tick.finished {
            self.state = TimerState::Finished;
            log::info!("Timer '{}' finished at {} ms", self.name, tick.value);
            self.fire(LifecycleEvent::Finish, tick.value);
        }
    }

    /// Run lifecycle subscriptions and publish the event
    fn fire(&mut self, event: LifecycleEvent, milliseconds: u64) {
        if let Some(control) = self.control() {
            self.notifier.fire_event(&control, event, milliseconds);
        }
        self.emit(TimerEvent::Lifecycle {
            name: self.name.clone(),
            event,
            milliseconds,
        });
    }

    fn control(&self) -> Option<TimerControl> {
        self.command_tx
            .upgrade()
            .map(|command_tx| TimerControl { command_tx })
    }

    fn emit(&self, event: TimerEvent) {
        // Use try_send to avoid blocking the tick loop if nobody reads events
        if let Err(e) = self.event_tx.try_send(event) {
            match e {
                mpsc::error::TrySendError::Full(event) => {
                    log::warn!(
                        "Event channel full, dropping {:?} from timer '{}'",
                        event,
                        self.name
                    );
                }
                mpsc::error::TrySendError::Closed(_) => {
                    log::debug!("Event channel closed for timer '{}'", self.name);
                }
            }
        }
    }
}

async fn next_tick(session: &mut Option<CountingSession>) -> Instant {
    match session {
        Some(session) => session.next_tick().await,
        None => std::future::pending().await,
    }
}

impl TimerControl {
    async fn send(&self, command: TimerCommand) -> Result<(), TimerError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| TimerError::Closed)
    }

    fn try_send(&self, command: TimerCommand) -> Result<(), TimerError> {
        self.command_tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TimerError::CommandQueueFull,
            mpsc::error::TrySendError::Closed(_) => TimerError::Closed,
        })
    }

    /// Validate `options` now and apply them to the next start
    pub async fn set_options(&self, options: TimerOptions) -> Result<(), TimerError> {
        let plan = options.resolve(Utc::now())?;
        self.send(TimerCommand::Configure(plan)).await
    }

    /// Validate `options` now and apply them to the next start (non-blocking)
    pub fn try_set_options(&self, options: TimerOptions) -> Result<(), TimerError> {
        let plan = options.resolve(Utc::now())?;
        self.try_send(TimerCommand::Configure(plan))
    }

    /// Start counting from the configured total, restarting if already running
    pub async fn start<F>(&self, on_interval: F) -> Result<(), TimerError>
    where
        F: FnMut(&CountResult) + Send + 'static,
    {
        self.start_with(Some(Box::new(on_interval))).await
    }

    /// Start counting (non-blocking); failures are logged by the timer task
    pub fn try_start<F>(&self, on_interval: F) -> Result<(), TimerError>
    where
        F: FnMut(&CountResult) + Send + 'static,
    {
        self.try_send(TimerCommand::Start {
            on_interval: Some(Box::new(on_interval)),
            reply: None,
        })
    }

    /// Start again with the interval callback from the previous start
    pub async fn restart(&self) -> Result<(), TimerError> {
        self.start_with(None).await
    }

    /// Start again with the previous interval callback (non-blocking)
    pub fn try_restart(&self) -> Result<(), TimerError> {
        self.try_send(TimerCommand::Start {
            on_interval: None,
            reply: None,
        })
    }

    async fn start_with(&self, on_interval: Option<IntervalCallback>) -> Result<(), TimerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Start {
            on_interval,
            reply: Some(reply),
        })
        .await?;
        rx.await.unwrap_or(Err(TimerError::Closed))
    }

    /// Suspend counting
    pub async fn suspend(&self) -> Result<(), TimerError> {
        self.send(TimerCommand::Suspend).await
    }

    /// Suspend counting (non-blocking)
    pub fn try_suspend(&self) -> Result<(), TimerError> {
        self.try_send(TimerCommand::Suspend)
    }

    /// Resume a suspended count
    pub async fn resume(&self) -> Result<(), TimerError> {
        self.send(TimerCommand::Resume).await
    }

    /// Resume a suspended count (non-blocking)
    pub fn try_resume(&self) -> Result<(), TimerError> {
        self.try_send(TimerCommand::Resume)
    }

    /// Register a threshold or lifecycle callback
    pub async fn notify_at<F>(
        &self,
        spec: NotifySpec,
        callback: F,
    ) -> Result<SubscriptionId, TimerError>
    where
        F: FnMut(&TimerControl, u64) + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Subscribe {
            spec,
            callback: Box::new(callback),
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| TimerError::Closed)
    }

    /// Register a threshold or lifecycle callback (non-blocking)
    pub fn try_notify_at<F>(&self, spec: NotifySpec, callback: F) -> Result<(), TimerError>
    where
        F: FnMut(&TimerControl, u64) + Send + 'static,
    {
        self.try_send(TimerCommand::Subscribe {
            spec,
            callback: Box::new(callback),
            reply: None,
        })
    }

    /// Current state and milliseconds
    pub async fn status(&self) -> Result<TimerStatus, TimerError> {
        let (reply, rx) = oneshot::channel();
        self.send(TimerCommand::Status { reply }).await?;
        rx.await.map_err(|_| TimerError::Closed)
    }

    /// Shutdown the timer task
    pub async fn shutdown(&self) -> Result<(), TimerError> {
        self.send(TimerCommand::Shutdown).await
    }

    /// Shutdown the timer task (non-blocking)
    pub fn try_shutdown(&self) -> Result<(), TimerError> {
        self.try_send(TimerCommand::Shutdown)
    }
}

impl fmt::Debug for TimerControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerControl")
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}

impl TimerHandle {
    /// A control that can be moved into callbacks
    pub fn control(&self) -> TimerControl {
        self.control.clone()
    }

    /// Receive the next timer event (blocking)
    pub async fn recv_event(&mut self) -> Option<TimerEvent> {
        self.event_rx.recv().await
    }

    /// Try to receive a timer event (non-blocking)
    pub fn try_recv_event(&mut self) -> Result<TimerEvent, mpsc::error::TryRecvError> {
        self.event_rx.try_recv()
    }
}

impl Deref for TimerHandle {
    type Target = TimerControl;

    fn deref(&self) -> &TimerControl {
        &self.control
    }
}
