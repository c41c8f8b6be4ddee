//! Idle-object eviction and the background maintenance thread

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::PoolConfiguration;
use crate::entry::EntryInfo;
use crate::factory::ObjectFactory;
use crate::pool::PoolInner;

/// Rule deciding which idle objects an eviction run removes
///
/// # Examples
///
/// ```
/// use generic_objectpool::{EvictionPolicy, PoolConfiguration};
/// use std::time::Duration;
///
/// // Retire objects after an hour even if they are used constantly
/// let config = PoolConfiguration::new()
///     .with_eviction_interval(Duration::from_secs(30))
///     .with_eviction_policy(EvictionPolicy::MaxLifetime(Duration::from_secs(3600)));
///
/// assert_eq!(config.eviction_policy, EvictionPolicy::MaxLifetime(Duration::from_secs(3600)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvictionPolicy {
    /// Evict on the configured idle times only
    #[default]
    IdleTime,

    /// Idle-time rules, plus any object older than the given lifetime
    MaxLifetime(Duration),
}

impl EvictionPolicy {
    /// Whether an idle entry should be evicted.
    ///
    /// The hard idle limit applies while the pool holds more than `min_idle`
    /// objects in total; the soft limit while more than `min_idle` are idle.
    pub fn should_evict(
        &self,
        config: &PoolConfiguration,
        info: &EntryInfo,
        idle_count: usize,
        total_count: usize,
        now: Instant,
    ) -> bool {
        let idle_time = info.idle_time(now);

        let hard = config
            .min_evictable_idle_time
            .is_some_and(|limit| idle_time > limit && total_count > config.min_idle);
        let soft = config
            .soft_min_evictable_idle_time
            .is_some_and(|limit| idle_time > limit && idle_count > config.min_idle);
        let expired = match self {
            Self::IdleTime => false,
            Self::MaxLifetime(lifetime) => info.age(now) > *lifetime,
        };

        hard || soft || expired
    }
}

/// Number of idle objects one run examines.
pub(crate) fn tests_per_run(num_tests: i32, idle: usize) -> usize {
    if num_tests >= 0 {
        (num_tests as usize).min(idle)
    } else {
        idle.div_ceil(num_tests.unsigned_abs() as usize)
    }
}

impl<F: ObjectFactory> PoolInner<F> {
    /// Run one eviction sweep. Returns the number of objects destroyed.
    pub(crate) fn evict(&self) -> usize {
        let now = Instant::now();
        let evicted = {
            let mut state = self.state.lock();
            if state.closed || state.idle.is_empty() {
                return 0;
            }

            let tests = tests_per_run(self.config.num_tests_per_eviction_run, state.idle.len());
            let mut total = state.total_count();
            let policy = self.config.eviction_policy;
            let config = &self.config;
            let evicted = state.idle.evict_oldest(tests, |info, idle_count| {
                let evict = policy.should_evict(config, info, idle_count, total, now);
                if evict {
                    total -= 1;
                }
                evict
            });
            if !evicted.is_empty() {
                self.release_capacity(&mut state);
            }
            evicted
        };

        let count = evicted.len();
        for entry in evicted {
            debug!(
                entry_id = entry.info.id,
                idle_ms = entry.info.idle_time(now).as_millis() as u64,
                "Evicting idle object"
            );
            self.metrics.evicted.fetch_add(1, Ordering::Relaxed);
            self.destroy_payload(entry.payload);
        }
        count
    }

    /// One maintenance tick: evict, reclaim abandoned objects, refill.
    pub(crate) fn run_maintenance(&self) {
        self.evict();
        if let Some(abandoned) = &self.config.abandoned {
            if abandoned.remove_abandoned_on_maintenance {
                self.remove_abandoned(abandoned);
            }
        }
        self.ensure_min_idle();
    }
}

/// Handle to the maintenance thread
pub(crate) struct Evictor {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl Evictor {
    /// Spawn the maintenance thread. It holds only a weak reference, so it
    /// exits on its own once the pool is dropped.
    pub fn start<F: ObjectFactory>(pool: Weak<PoolInner<F>>, period: Duration) -> io::Result<Self> {
        let (shutdown, signal) = channel::bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("objectpool-evictor".to_string())
            .spawn(move || {
                debug!(period_ms = period.as_millis() as u64, "Maintenance thread started");
                loop {
                    match signal.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let Some(pool) = pool.upgrade() else {
                        break;
                    };
                    let tick = panic::catch_unwind(AssertUnwindSafe(|| pool.run_maintenance()));
                    if tick.is_err() {
                        warn!("Pool maintenance panicked; retrying next period");
                    }
                }
                debug!("Maintenance thread stopped");
            })?;

        Ok(Self { shutdown, handle })
    }

    /// Signal the thread and wait for it, unless called from the thread
    /// itself (the last pool handle dropped during a tick).
    pub fn stop(self) {
        let _ = self.shutdown.try_send(());
        if self.handle.thread().id() == thread::current().id() {
            return;
        }
        if self.handle.join().is_err() {
            warn!("Maintenance thread panicked");
        }
    }
}
