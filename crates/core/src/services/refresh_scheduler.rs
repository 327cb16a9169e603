use std::time::Duration;
use tokio::time::Instant;

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the periodic timer or a trigger.
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// A fetch was requested too soon after the previous one and is deferred.
    Cooldown,
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First fetch after the tracker starts.
    Startup,
    /// The periodic timer fired.
    Periodic,
    /// The user asked for a refresh.
    Manual,
    /// A holding was added, edited or removed.
    HoldingsChanged,
    /// Triggers arrived while a fetch was in flight.
    FollowUp,
}

impl RefreshTrigger {
    /// Timer-driven fetches are already spaced out and skip the cooldown.
    fn bypasses_cooldown(self) -> bool {
        matches!(self, RefreshTrigger::Startup | RefreshTrigger::Periodic)
    }
}

/// Decision returned to the driver after every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshAction {
    /// Start a fetch now.
    StartFetch,
    /// Folded into a fetch that is already in flight or already deferred.
    Coalesced,
    /// Deferred until the cooldown ends at the given instant.
    Deferred(Instant),
    /// Nothing to do.
    None,
}

/// State machine deciding when price fetches happen.
///
/// It does no I/O and owns no timers; the driver feeds it events with the
/// current instant and acts on the returned [`RefreshAction`]:
///
/// - At most one fetch is in flight. Triggers while fetching set a single
///   follow-up flag, so any number of them cause exactly one more fetch.
/// - The periodic deadline is rearmed when a fetch finishes, successful or not.
/// - Non-timer triggers within `min_gap` of the last fetch start are deferred
///   to the end of the gap and collapse into one fetch.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    state: SchedulerState,
    interval: Duration,
    min_gap: Duration,
    next_periodic: Instant,
    cooldown_until: Option<Instant>,
    last_started: Option<Instant>,
    follow_up: bool,
    fetches_started: u64,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, min_gap: Duration, now: Instant) -> Self {
        Self {
            state: SchedulerState::Idle,
            interval,
            min_gap,
            next_periodic: later(now, interval),
            cooldown_until: None,
            last_started: None,
            follow_up: false,
            fetches_started: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    pub fn follow_up_pending(&self) -> bool {
        self.follow_up
    }

    pub fn fetches_started(&self) -> u64 {
        self.fetches_started
    }

    /// A refresh was requested.
    pub fn trigger(&mut self, reason: RefreshTrigger, now: Instant) -> RefreshAction {
        match self.state {
            SchedulerState::Fetching => {
                self.follow_up = true;
                RefreshAction::Coalesced
            }
            SchedulerState::Cooldown => RefreshAction::Coalesced,
            SchedulerState::Idle => {
                if !reason.bypasses_cooldown() {
                    if let Some(ready_at) = self.cooldown_end(now) {
                        self.state = SchedulerState::Cooldown;
                        self.cooldown_until = Some(ready_at);
                        return RefreshAction::Deferred(ready_at);
                    }
                }
                self.start(now)
            }
        }
    }

    /// The in-flight fetch completed (either way).
    pub fn fetch_finished(&mut self, now: Instant) -> RefreshAction {
        if self.state != SchedulerState::Fetching {
            return RefreshAction::None;
        }
        self.state = SchedulerState::Idle;
        self.next_periodic = later(now, self.interval);

        if std::mem::take(&mut self.follow_up) {
            return self.trigger(RefreshTrigger::FollowUp, now);
        }
        RefreshAction::None
    }

    /// When the driver should next call [`RefreshScheduler::on_wakeup`].
    /// `None` while fetching: the fetch result is the next event.
    pub fn next_wakeup(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Idle => Some(self.next_periodic),
            SchedulerState::Cooldown => self.cooldown_until,
            SchedulerState::Fetching => None,
        }
    }

    /// A deadline returned by `next_wakeup` was reached.
    pub fn on_wakeup(&mut self, now: Instant) -> RefreshAction {
        match self.state {
            SchedulerState::Cooldown => match self.cooldown_until {
                Some(ready_at) if now < ready_at => RefreshAction::None,
                _ => self.start(now),
            },
            SchedulerState::Idle if now >= self.next_periodic => {
                self.trigger(RefreshTrigger::Periodic, now)
            }
            _ => RefreshAction::None,
        }
    }

    fn start(&mut self, now: Instant) -> RefreshAction {
        self.state = SchedulerState::Fetching;
        self.cooldown_until = None;
        self.last_started = Some(now);
        self.follow_up = false;
        self.fetches_started += 1;
        RefreshAction::StartFetch
    }

    /// End of the cooldown if `now` is still inside it.
    fn cooldown_end(&self, now: Instant) -> Option<Instant> {
        if self.min_gap.is_zero() {
            return None;
        }
        let ready_at = later(self.last_started?, self.min_gap);
        (now < ready_at).then_some(ready_at)
    }
}

/// Roughly thirty years: far enough to never fire, small enough to add to any `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// `at + by`, clamped instead of overflowing.
fn later(at: Instant, by: Duration) -> Instant {
    at.checked_add(by)
        .or_else(|| at.checked_add(FAR_FUTURE))
        .unwrap_or(at)
}
