//! Clock abstraction and periodic scheduling, generalized from the
//! teacher's `TimeProvider`/`TickTimer`. Every timer in this crate (ARP
//! probe backoff, cTCP retransmission/time-wait, BBR's min-RTT filter
//! window) goes through here so tests can freeze and advance time instead
//! of racing a wall clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};

/// Provides a mockable notion of "now".
pub struct TimeProvider {
    frozen: Option<SystemTime>,
    offset: Duration,
    last_unfrozen: SystemTime,
}

impl TimeProvider {
    /// A process-wide clock. Every call site asks this instead of
    /// `SystemTime::now()` directly so tests can freeze time deterministically.
    pub fn instance() -> &'static Mutex<Self> {
        static INSTANCE: OnceLock<Mutex<TimeProvider>> = OnceLock::new();
        INSTANCE.get_or_init(|| Mutex::new(TimeProvider::new()))
    }

    pub fn new() -> Self {
        Self {
            frozen: None,
            offset: Duration::ZERO,
            last_unfrozen: SystemTime::now(),
        }
    }

    /// Freezes the clock at its current value until `unfreeze` is called.
    pub fn freeze(&mut self) {
        if self.frozen.is_some() {
            panic!("TimeProvider is already frozen");
        }
        self.frozen = Some(self.now());
    }

    pub fn unfreeze(&mut self) {
        let Some(frozen_time) = self.frozen else {
            panic!("TimeProvider is not frozen");
        };
        self.offset += frozen_time
            .duration_since(self.last_unfrozen)
            .unwrap_or(Duration::ZERO);
        self.frozen = None;
        self.last_unfrozen = SystemTime::now();
    }

    /// Advances a frozen clock by `duration`. Only valid while frozen.
    pub fn advance(&mut self, duration: Duration) {
        match self.frozen {
            Some(frozen_time) => self.frozen = Some(frozen_time + duration),
            None => panic!("TimeProvider is not frozen"),
        }
    }

    pub fn now(&self) -> SystemTime {
        match self.frozen {
            Some(frozen_time) => frozen_time,
            None => SystemTime::now() + self.offset,
        }
    }
}

impl Default for TimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the current time from the shared [`TimeProvider`].
pub fn now() -> SystemTime {
    TimeProvider::instance().lock().unwrap().now()
}

/// Anything driven by the cooperative event loop's periodic tick.
pub trait Tickable {
    fn tick(&mut self);
}

/// Schedules keyed events to fire after an interval, re-evaluated on each
/// `tick`. Used for ARP probe backoff and BBR's min-RTT filter window.
pub struct TickTimer<T: Eq + Hash + Clone> {
    scheduled: HashMap<T, (SystemTime, Duration, bool)>, // (ready_at, interval, persist)
}

impl<T: Eq + Hash + Clone> TickTimer<T> {
    pub fn new() -> Self {
        TickTimer {
            scheduled: HashMap::new(),
        }
    }

    /// Schedules `key` to become ready after `interval_secs`, unless already scheduled.
    pub fn schedule(&mut self, key: T, interval_secs: u64, persist: bool) {
        if self.scheduled.contains_key(&key) {
            return;
        }
        let interval = Duration::new(interval_secs, 0);
        self.scheduled.insert(key, (now() + interval, interval, persist));
    }

    /// Cancels a scheduled key, if present.
    pub fn cancel(&mut self, key: &T) {
        self.scheduled.remove(key);
    }

    /// Returns the keys whose interval has elapsed.
    pub fn ready(&self) -> Vec<T> {
        let n = now();
        self.scheduled
            .iter()
            .filter(|(_, (ready_at, _, _))| *ready_at <= n)
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl<T: Eq + Hash + Clone> Default for TickTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> Tickable for TickTimer<T> {
    fn tick(&mut self) {
        let n = now();
        self.scheduled.retain(|_, (ready_at, _, persist)| *ready_at > n || *persist);
        for (ready_at, interval, persist) in self.scheduled.values_mut() {
            if *ready_at > n || !*persist {
                continue;
            }
            *ready_at = n + *interval;
        }
    }
}
