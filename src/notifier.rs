//! Threshold and lifecycle subscriptions
//!
//! Time-offset subscriptions fire at most once between two calls to
//! [`ThresholdNotifier::reset`]. Lifecycle subscriptions fire every time the
//! matching transition happens.

use crate::config::Direction;
use crate::time::TimeSpec;

/// Callback invoked with the owner reference and the current milliseconds
pub type NotifyCallback<O> = Box<dyn FnMut(&O, u64) + Send + 'static>;

/// Where a time offset is measured from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Offset before the end of the count
    #[default]
    BeforeEnd,
    /// Offset after the start of the count
    AfterStart,
}

/// Timer state transitions that can be subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Start,
    Suspend,
    Resume,
    Finish,
}

/// What a subscription listens for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifySpec {
    Event(LifecycleEvent),
    Offset { duration: TimeSpec, anchor: Anchor },
}

impl NotifySpec {
    pub fn on(event: LifecycleEvent) -> Self {
        NotifySpec::Event(event)
    }

    pub fn before_end(duration: TimeSpec) -> Self {
        NotifySpec::Offset {
            duration,
            anchor: Anchor::BeforeEnd,
        }
    }

    pub fn after_start(duration: TimeSpec) -> Self {
        NotifySpec::Offset {
            duration,
            anchor: Anchor::AfterStart,
        }
    }
}

/// Identifies a subscription within one notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(usize);

struct OffsetSubscription<O> {
    id: SubscriptionId,
    target_ms: u64,
    anchor: Anchor,
    direction: Direction,
    fired: bool,
    callback: NotifyCallback<O>,
}

impl<O> OffsetSubscription<O> {
    /// Whether `current` has crossed this subscription's threshold.
    ///
    /// `starting_point` is the session total; `None` for open-ended counts,
    /// where "before end" has no meaning.
    fn crossed(&self, starting_point: Option<u64>, current: u64) -> bool {
        match (self.direction, self.anchor) {
            (Direction::Down, Anchor::BeforeEnd) => self.target_ms >= current,
            (Direction::Down, Anchor::AfterStart) => match starting_point {
                Some(start) => start
                    .checked_sub(self.target_ms)
                    .is_some_and(|threshold| threshold >= current),
                None => false,
            },
            (Direction::Up, Anchor::BeforeEnd) => match starting_point {
                // an offset longer than the whole count is crossed immediately
                Some(start) => start
                    .checked_sub(self.target_ms)
                    .map_or(true, |threshold| threshold <= current),
                None => false,
            },
            (Direction::Up, Anchor::AfterStart) => self.target_ms <= current,
        }
    }
}

struct EventSubscription<O> {
    event: LifecycleEvent,
    callback: NotifyCallback<O>,
}

/// Registry of subscriptions owned by a single timer.
///
/// Generic over the owner reference handed to callbacks, so the timer can
/// pass its control handle without the notifier knowing about it.
pub struct ThresholdNotifier<O> {
    offsets: Vec<OffsetSubscription<O>>,
    events: Vec<EventSubscription<O>>,
    starting_point: Option<u64>,
    next_id: usize,
}

impl<O> ThresholdNotifier<O> {
    pub fn new() -> Self {
        Self {
            offsets: Vec::new(),
            events: Vec::new(),
            starting_point: None,
            next_id: 0,
        }
    }

    /// Register a subscription, tagged with the direction active right now
    pub fn subscribe(
        &mut self,
        spec: NotifySpec,
        direction: Direction,
        callback: NotifyCallback<O>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        match spec {
            NotifySpec::Event(event) => {
                self.events.push(EventSubscription { event, callback });
            }
            NotifySpec::Offset { duration, anchor } => {
                self.offsets.push(OffsetSubscription {
                    id,
                    target_ms: duration.total_millis(),
                    anchor,
                    direction,
                    fired: false,
                    callback,
                });
            }
        }
        id
    }

    /// Session total used for offset arithmetic; set once per session
    pub fn set_starting_point(&mut self, starting_point: Option<u64>) {
        self.starting_point = starting_point;
    }

    pub fn starting_point(&self) -> Option<u64> {
        self.starting_point
    }

    /// Fire every unfired offset subscription of `direction` whose threshold
    /// `current` has crossed. Returns the ids that fired, in registration order.
    pub fn evaluate(
        &mut self,
        owner: &O,
        direction: Direction,
        current: u64,
    ) -> Vec<SubscriptionId> {
        let starting_point = self.starting_point;
        let mut fired = Vec::new();

        for subscription in self
            .offsets
            .iter_mut()
            .filter(|s| !s.fired && s.direction == direction)
        {
            if subscription.crossed(starting_point, current) {
                subscription.fired = true;
                (subscription.callback)(owner, current);
                fired.push(subscription.id);
            }
        }
        fired
    }

    /// Invoke every subscription registered for `event`
    pub fn fire_event(&mut self, owner: &O, event: LifecycleEvent, current: u64) {
        for subscription in self.events.iter_mut().filter(|s| s.event == event) {
            (subscription.callback)(owner, current);
        }
    }

    /// Make every offset subscription eligible to fire again
    pub fn reset(&mut self) {
        for subscription in &mut self.offsets {
            subscription.fired = false;
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O> Default for ThresholdNotifier<O> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<u64>>>;

    fn recorder(calls: &Calls) -> NotifyCallback<()> {
        let calls = Arc::clone(calls);
        Box::new(move |_, ms| calls.lock().unwrap().push(ms))
    }

    fn secs(n: u64) -> TimeSpec {
        TimeSpec::default().with_seconds(n)
    }

    #[test]
    fn test_down_before_end_fires_once() {
        let calls = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(10_000));
        let spec = NotifySpec::before_end(secs(3));
        let id = notifier.subscribe(spec, Direction::Down, recorder(&calls));

        assert!(notifier.evaluate(&(), Direction::Down, 5_000).is_empty());
        assert_eq!(notifier.evaluate(&(), Direction::Down, 3_000), vec![id]);
        assert!(notifier.evaluate(&(), Direction::Down, 2_000).is_empty());
        assert!(notifier.evaluate(&(), Direction::Down, 0).is_empty());

        assert_eq!(*calls.lock().unwrap(), vec![3_000]);
    }

    #[test]
    fn test_down_after_start() {
        let calls = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(10_000));
        notifier.subscribe(NotifySpec::after_start(secs(4)), Direction::Down, recorder(&calls));

        notifier.evaluate(&(), Direction::Down, 7_000);
        notifier.evaluate(&(), Direction::Down, 5_999);
        notifier.evaluate(&(), Direction::Down, 5_000);

        assert_eq!(*calls.lock().unwrap(), vec![5_999]);
    }

    #[test]
    fn test_up_before_end_and_after_start() {
        let before = Calls::default();
        let after = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(10_000));
        notifier.subscribe(NotifySpec::before_end(secs(2)), Direction::Up, recorder(&before));
        notifier.subscribe(NotifySpec::after_start(secs(2)), Direction::Up, recorder(&after));

        notifier.evaluate(&(), Direction::Up, 1_000);
        notifier.evaluate(&(), Direction::Up, 2_000);
        notifier.evaluate(&(), Direction::Up, 8_000);
        notifier.evaluate(&(), Direction::Up, 9_000);

        assert_eq!(*after.lock().unwrap(), vec![2_000]);
        assert_eq!(*before.lock().unwrap(), vec![8_000]);
    }

    #[test]
    fn test_other_direction_is_ignored() {
        let calls = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(10_000));
        notifier.subscribe(NotifySpec::after_start(secs(1)), Direction::Up, recorder(&calls));

        assert!(notifier.evaluate(&(), Direction::Down, 5_000).is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_offset_larger_than_total() {
        let up = Calls::default();
        let down = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(1_000));
        notifier.subscribe(NotifySpec::before_end(secs(5)), Direction::Up, recorder(&up));
        notifier.subscribe(NotifySpec::after_start(secs(5)), Direction::Down, recorder(&down));

        notifier.evaluate(&(), Direction::Up, 0);
        notifier.evaluate(&(), Direction::Down, 0);

        assert_eq!(*up.lock().unwrap(), vec![0]);
        assert!(down.lock().unwrap().is_empty());
    }

    #[test]
    fn test_open_ended_skips_before_end() {
        let calls = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(None);
        notifier.subscribe(NotifySpec::before_end(secs(1)), Direction::Up, recorder(&calls));

        notifier.evaluate(&(), Direction::Up, u64::MAX);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reset_rearms_offsets() {
        let calls = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.set_starting_point(Some(10_000));
        notifier.subscribe(NotifySpec::after_start(secs(1)), Direction::Up, recorder(&calls));

        notifier.evaluate(&(), Direction::Up, 1_500);
        notifier.evaluate(&(), Direction::Up, 2_500);
        notifier.reset();
        notifier.evaluate(&(), Direction::Up, 1_200);

        assert_eq!(*calls.lock().unwrap(), vec![1_500, 1_200]);
    }

    #[test]
    fn test_lifecycle_events_are_not_gated() {
        let starts = Calls::default();
        let finishes = Calls::default();
        let mut notifier = ThresholdNotifier::new();
        notifier.subscribe(NotifySpec::on(LifecycleEvent::Start), Direction::Up, recorder(&starts));
        notifier.subscribe(NotifySpec::on(LifecycleEvent::Finish), Direction::Up, recorder(&finishes));
        assert_eq!(notifier.len(), 2);

        notifier.fire_event(&(), LifecycleEvent::Start, 0);
        notifier.fire_event(&(), LifecycleEvent::Start, 0);
        notifier.fire_event(&(), LifecycleEvent::Finish, 500);

        assert_eq!(*starts.lock().unwrap(), vec![0, 0]);
        assert_eq!(*finishes.lock().unwrap(), vec![500]);
    }
}
