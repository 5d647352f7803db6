//! Visible keys and the shared poll timer.
//!
//! The timer runs exactly while at least one key is registered: the first
//! registration starts it, removing the last key stops it. A stopped timer
//! never fires, so the engine's select loop simply waits on host events.

use std::collections::HashMap;
use std::collections::hash_map;
use std::future;
use std::time::Duration;

use log::info;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::binding::SensorBinding;
use crate::host::KeyId;

// =============================================================================
// Poll Timer
// =============================================================================

/// Fixed-cadence timer that can be started and stopped.
///
/// The underlying tokio interval is created on the first `tick` after a start,
/// so starting and stopping work outside a runtime. The first tick fires one
/// period after that, not immediately.
pub struct PollTimer {
    period: Duration,
    running: bool,
    interval: Option<Interval>,
    starts: u64,
}

impl PollTimer {
    /// Shortest period the timer runs at; tokio intervals cannot be zero.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Self::MIN_PERIOD),
            running: false,
            interval: None,
            starts: 0,
        }
    }

    pub const fn period(&self) -> Duration { self.period }

    pub const fn is_running(&self) -> bool { self.running }

    /// How many times the timer has gone from stopped to running.
    pub const fn starts(&self) -> u64 { self.starts }

    /// Start the timer. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.interval = None;
        self.starts += 1;
        true
    }

    /// Stop the timer. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.interval = None;
        was_running
    }

    /// Wait for the next tick. Never completes while stopped.
    ///
    /// Cancel safe: dropping the future keeps the schedule.
    pub async fn tick(&mut self) {
        if !self.running {
            return future::pending().await;
        }
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await;
    }
}

// =============================================================================
// Key Registry
// =============================================================================

pub struct KeyRegistry {
    bindings: HashMap<KeyId, SensorBinding>,
    timer: PollTimer,
}

impl KeyRegistry {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            bindings: HashMap::new(),
            timer: PollTimer::new(poll_interval),
        }
    }

    /// Store `binding` under `key`, starting the timer if this is the first
    /// key. Returns the binding it replaced, if any; the caller destroys it.
    pub fn register(
        &mut self,
        key: KeyId,
        binding: SensorBinding,
    ) -> Option<SensorBinding> {
        let replaced = self.bindings.insert(key, binding);
        if self.timer.start() {
            info!("poll timer started ({:?} cadence)", self.timer.period());
        }
        replaced
    }

    /// Remove `key`, stopping the timer if no keys remain. Removing an
    /// unknown key is a no-op.
    pub fn deregister(
        &mut self,
        key: &KeyId,
    ) -> Option<SensorBinding> {
        let removed = self.bindings.remove(key);
        if self.bindings.is_empty() && self.timer.stop() {
            info!("poll timer stopped, no visible keys");
        }
        removed
    }

    pub fn lookup(
        &self,
        key: &KeyId,
    ) -> Option<&SensorBinding> {
        self.bindings.get(key)
    }

    pub fn lookup_mut(
        &mut self,
        key: &KeyId,
    ) -> Option<&mut SensorBinding> {
        self.bindings.get_mut(key)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, KeyId, SensorBinding> { self.bindings.iter() }

    pub fn len(&self) -> usize { self.bindings.len() }

    pub fn is_empty(&self) -> bool { self.bindings.is_empty() }

    pub const fn timer(&self) -> &PollTimer { &self.timer }

    pub const fn timer_running(&self) -> bool { self.timer.is_running() }

    /// Wait for the next poll tick.
    pub async fn tick(&mut self) { self.timer.tick().await }
}

// =============================================================================
// Unit Tests
// =============================================================================
