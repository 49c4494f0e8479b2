use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::GovernorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub timestamp: Instant,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub current: usize,
    pub max: usize,
    pub remaining: usize,
    /// `now + window`. The oldest record may age out earlier than this.
    pub reset_time: Instant,
    pub queued: usize,
    pub blocked: bool,
}

#[derive(Debug, Default)]
struct Cooldown {
    blocked: bool,
    blocked_until: Option<Instant>,
}

struct Waiter {
    id: u64,
    tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct State {
    window: VecDeque<RequestRecord>,
    cooldown: Cooldown,
    queue: VecDeque<Waiter>,
    // slots handed out by wait_for_slot that have not been recorded yet
    reserved: usize,
    next_waiter_id: u64,
}

impl State {
    fn prune(&mut self, window: Duration, now: Instant) {
        while let Some(record) = self.window.front() {
            if now.saturating_duration_since(record.timestamp) >= window {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn check_admission(&mut self, config: &GovernorConfig, now: Instant) -> bool {
        self.prune(config.window, now);

        if self.cooldown.blocked {
            if matches!(self.cooldown.blocked_until, Some(until) if now < until) {
                return false;
            }

            debug!("Cooldown elapsed, resuming admission");
            self.cooldown = Cooldown::default();
            self.drain(config, now);
        }

        self.window.len() + self.reserved < config.max_requests
    }

    fn drain(&mut self, config: &GovernorConfig, now: Instant) {
        while !self.queue.is_empty() && self.check_admission(config, now) {
            let waiter = match self.queue.pop_front() {
                Some(waiter) => waiter,
                None => break,
            };

            if waiter.tx.send(()).is_ok() {
                self.reserved += 1;
                debug!(waiter = waiter.id, queued = self.queue.len(), "Released waiter");
            }
        }
    }

    // earliest instant at which a refused caller could be admitted
    fn next_wakeup(&self, config: &GovernorConfig) -> Option<Instant> {
        if self.cooldown.blocked {
            return self.cooldown.blocked_until;
        }

        self.window
            .front()
            .map(|record| record.timestamp + config.window)
    }

    fn enqueue(&mut self, id: u64) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.queue.push_back(Waiter { id, tx });

        debug!(waiter = id, position = self.queue.len(), "Admission refused, queueing");
        rx
    }

    fn is_blocked(&self, now: Instant) -> bool {
        self.cooldown.blocked && matches!(self.cooldown.blocked_until, Some(until) if now < until)
    }
}

/// Sliding-window admission control for calls against a remote quota.
///
/// All state sits behind one mutex which is never held across an await point. Callers that are
/// refused admission queue up and are released strictly in arrival order.
pub struct RateGovernor {
    config: GovernorConfig,
    state: Mutex<State>,
    // wakes queued callers whose next wakeup may have moved
    changed: Notify,
}

impl RateGovernor {
    pub fn new(config: GovernorConfig) -> RateGovernor {
        RateGovernor {
            config,
            state: Mutex::new(State::default()),
            changed: Notify::new(),
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Returns whether a request could be admitted right now. Only prunes the window, never
    /// inserts into it. Clears an elapsed cooldown and releases queued waiters as a side effect.
    pub fn check_admission(&self) -> bool {
        self.state
            .lock()
            .check_admission(&self.config, Instant::now())
    }

    /// Records a request the caller has already been admitted for. Must be called exactly once
    /// per admitted request. Slots obtained from [`RateGovernor::wait_for_slot`] are recorded with
    /// [`Admission::record`] instead.
    pub fn record_request(&self, endpoint: impl Into<String>) {
        let now = Instant::now();
        let endpoint = endpoint.into();

        let mut state = self.state.lock();
        debug!(%endpoint, current = state.window.len() + 1, "Recording request");
        state.window.push_back(RequestRecord {
            timestamp: now,
            endpoint,
        });

        drop(state);
        self.changed.notify_waiters();
    }

    /// Suspends until the caller is admitted. The returned [`Admission`] holds one unit of
    /// capacity until it is recorded or dropped.
    ///
    /// There is no timeout. Dropping the future (e.g. from `tokio::time::timeout`) withdraws the
    /// caller from the queue without disturbing the order of the remaining waiters.
    pub async fn wait_for_slot(&self) -> Admission<'_> {
        let (id, mut rx) = {
            let mut state = self.state.lock();
            let now = Instant::now();

            if state.check_admission(&self.config, now) {
                // earlier arrivals go first
                state.drain(&self.config, now);

                if state.queue.is_empty() && state.check_admission(&self.config, now) {
                    state.reserved += 1;
                    return Admission::new(self);
                }
            }

            let id = state.next_waiter_id;
            state.next_waiter_id += 1;

            (id, state.enqueue(id))
        };

        let mut pending = PendingWaiter {
            governor: self,
            id,
            released: false,
        };

        loop {
            // registered before reading the state so a record made in between still wakes us
            let changed = self.changed.notified();
            let wakeup = self.state.lock().next_wakeup(&self.config);

            let deadline = async {
                match wakeup {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                res = &mut rx => match res {
                    Ok(()) => {
                        pending.released = true;
                        return Admission::new(self);
                    }
                    // dropped without a release, rejoin at the back like a new arrival
                    Err(_) => rx = self.state.lock().enqueue(id),
                },
                _ = deadline => self.sweep(),
                _ = changed => self.sweep(),
            }
        }
    }

    /// Blocks all admission for `retry_after`, or the configured default cooldown when the
    /// remote side gave no hint.
    pub fn report_limit_hit(&self, retry_after: Option<Duration>) {
        let cooldown = retry_after.unwrap_or(self.config.default_cooldown);
        let blocked_until = Instant::now() + cooldown;

        let mut state = self.state.lock();
        state.cooldown = Cooldown {
            blocked: true,
            blocked_until: Some(blocked_until),
        };

        warn!(?cooldown, queued = state.queue.len(), "Remote quota exceeded, blocking admission");

        drop(state);
        self.changed.notify_waiters();
    }

    pub fn status(&self) -> Status {
        let now = Instant::now();

        let mut state = self.state.lock();
        state.prune(self.config.window, now);

        let current = state.window.len();
        let max = self.config.max_requests;

        Status {
            current,
            max,
            remaining: max.saturating_sub(current),
            reset_time: now + self.config.window,
            queued: state.queue.len(),
            blocked: state.is_blocked(now),
        }
    }

    pub fn endpoint_stats(&self) -> HashMap<String, usize> {
        let mut state = self.state.lock();
        state.prune(self.config.window, Instant::now());

        state
            .window
            .iter()
            .fold(HashMap::new(), |mut stats, record| {
                *stats.entry(record.endpoint.clone()).or_insert(0) += 1;
                stats
            })
    }

    /// Prunes the window and releases any waiters that can now proceed.
    pub fn sweep(&self) {
        let now = Instant::now();

        let mut state = self.state.lock();
        let before = state.window.len();

        state.check_admission(&self.config, now);
        state.drain(&self.config, now);

        let after = state.window.len();
        if before != after {
            debug!(removed = before - after, remaining = after, "Pruned request window");
        }
    }
}

/// Runs [`RateGovernor::sweep`] every `every`. Admission does not depend on this task; it only
/// keeps the window from growing while the governor is idle.
///
/// Panics if `every` is zero.
pub fn spawn_sweeper(governor: Arc<RateGovernor>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            governor.sweep();
        }
    })
}

/// A slot granted by [`RateGovernor::wait_for_slot`].
#[must_use = "the slot stays reserved until it is recorded or dropped"]
pub struct Admission<'a> {
    governor: &'a RateGovernor,
    pending: bool,
}

impl<'a> Admission<'a> {
    fn new(governor: &'a RateGovernor) -> Admission<'a> {
        Admission {
            governor,
            pending: true,
        }
    }

    /// Turns the reservation into a request record.
    pub fn record(mut self, endpoint: impl Into<String>) {
        let governor = self.governor;
        let endpoint = endpoint.into();

        let mut state = governor.state.lock();
        state.reserved = state.reserved.saturating_sub(1);
        debug!(%endpoint, current = state.window.len() + 1, "Recording request");
        state.window.push_back(RequestRecord {
            timestamp: Instant::now(),
            endpoint,
        });
        drop(state);

        self.pending = false;
        governor.changed.notify_waiters();
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }

        let mut state = self.governor.state.lock();
        state.reserved = state.reserved.saturating_sub(1);
        state.drain(&self.governor.config, Instant::now());
    }
}

// Removes a cancelled waiter from the queue.
struct PendingWaiter<'a> {
    governor: &'a RateGovernor,
    id: u64,
    released: bool,
}

impl Drop for PendingWaiter<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let mut state = self.governor.state.lock();
        let before = state.queue.len();
        state.queue.retain(|waiter| waiter.id != self.id);

        if state.queue.len() == before {
            // released but never resumed, pass the slot on
            state.reserved = state.reserved.saturating_sub(1);
            state.drain(&self.governor.config, Instant::now());
        } else {
            debug!(waiter = self.id, "Waiter cancelled");
        }
    }
}
