//! Pool configuration options

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{PoolError, PoolResult};
use crate::eviction::EvictionPolicy;

/// Configuration for object pool behavior
///
/// # Examples
///
/// ```
/// use generic_objectpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_max_total(5)
///     .with_min_idle(1)
///     .with_max_wait(Duration::from_millis(100))
///     .with_eviction_interval(Duration::from_millis(10));
///
/// assert_eq!(config.max_total, 5);
/// assert_eq!(config.max_wait, Some(Duration::from_millis(100)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolConfiguration {
    /// Maximum number of objects (idle + active) the pool may hold
    pub max_total: usize,

    /// Maximum number of idle objects kept around
    pub max_idle: usize,

    /// Number of idle objects maintenance tries to keep available
    pub min_idle: usize,

    /// Serve the most recently returned idle object first
    pub lifo: bool,

    /// Block borrowers when exhausted instead of failing immediately
    pub block_when_exhausted: bool,

    /// How long a blocked borrow waits; `None` waits forever
    pub max_wait: Option<Duration>,

    /// Validate freshly created objects before lending them
    pub test_on_create: bool,

    /// Validate idle objects before lending them
    pub test_on_borrow: bool,

    /// Validate objects when they come back
    pub test_on_return: bool,

    /// Period of the background maintenance task; `None` or zero disables it
    pub time_between_eviction_runs: Option<Duration>,

    /// Idle time after which an object may be evicted; `None` disables
    pub min_evictable_idle_time: Option<Duration>,

    /// Idle time after which an object may be evicted while more than
    /// `min_idle` objects are idle
    pub soft_min_evictable_idle_time: Option<Duration>,

    /// Idle objects examined per eviction run. Negative values examine
    /// `ceil(idle / |n|)` objects.
    pub num_tests_per_eviction_run: i32,

    /// Rule deciding which examined objects are evicted
    pub eviction_policy: EvictionPolicy,

    /// Abandoned-object reclamation; `None` disables it
    pub abandoned: Option<AbandonedConfig>,

    /// Report returns of objects the pool no longer tracks as errors
    pub fail_on_unknown_return: bool,

    /// Fill the pool up to `min_idle` when it is built
    pub warmup: bool,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            max_total: 8,
            max_idle: 8,
            min_idle: 0,
            lifo: true,
            block_when_exhausted: true,
            max_wait: None,
            test_on_create: false,
            test_on_borrow: true,
            test_on_return: true,
            time_between_eviction_runs: None,
            min_evictable_idle_time: Some(Duration::from_secs(30 * 60)),
            soft_min_evictable_idle_time: None,
            num_tests_per_eviction_run: 3,
            eviction_policy: EvictionPolicy::default(),
            abandoned: None,
            fail_on_unknown_return: true,
            warmup: false,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the sizing options are consistent.
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_total == 0 {
            return Err(PoolError::InvalidConfiguration(
                "max_total must be greater than 0".to_string(),
            ));
        }
        if self.min_idle > self.max_idle {
            return Err(PoolError::InvalidConfiguration(format!(
                "min_idle ({}) must not exceed max_idle ({})",
                self.min_idle, self.max_idle
            )));
        }
        Ok(())
    }

    /// The maintenance period, if maintenance is enabled.
    pub(crate) fn eviction_interval(&self) -> Option<Duration> {
        self.time_between_eviction_runs.filter(|period| !period.is_zero())
    }

    /// Set the maximum number of objects
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_objectpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_max_total(50);
    ///
    /// assert_eq!(config.max_total, 50);
    /// ```
    pub fn with_max_total(mut self, max_total: usize) -> Self {
        self.max_total = max_total;
        self
    }

    /// Set the maximum number of idle objects
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Set the number of idle objects maintenance keeps available
    pub fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Serve idle objects oldest-first instead of most-recent-first
    pub fn with_fifo(mut self) -> Self {
        self.lifo = false;
        self
    }

    /// Choose whether exhausted borrows wait or fail at once
    pub fn with_block_when_exhausted(mut self, block: bool) -> Self {
        self.block_when_exhausted = block;
        self
    }

    /// Set how long a borrow may block
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Validate freshly created objects
    pub fn with_test_on_create(mut self, enabled: bool) -> Self {
        self.test_on_create = enabled;
        self
    }

    /// Validate idle objects before lending them
    pub fn with_test_on_borrow(mut self, enabled: bool) -> Self {
        self.test_on_borrow = enabled;
        self
    }

    /// Validate objects when they come back
    pub fn with_test_on_return(mut self, enabled: bool) -> Self {
        self.test_on_return = enabled;
        self
    }

    /// Enable the background maintenance task
    pub fn with_eviction_interval(mut self, period: Duration) -> Self {
        self.time_between_eviction_runs = Some(period);
        self
    }

    /// Set idle time after which objects may be evicted
    pub fn with_min_evictable_idle_time(mut self, idle: Duration) -> Self {
        self.min_evictable_idle_time = Some(idle);
        self
    }

    /// Set idle time after which objects above `min_idle` may be evicted
    pub fn with_soft_min_evictable_idle_time(mut self, idle: Duration) -> Self {
        self.soft_min_evictable_idle_time = Some(idle);
        self
    }

    /// Set idle objects examined per eviction run
    pub fn with_num_tests_per_eviction_run(mut self, tests: i32) -> Self {
        self.num_tests_per_eviction_run = tests;
        self
    }

    /// Set the eviction rule
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Enable abandoned-object reclamation
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_objectpool::{AbandonedConfig, PoolConfiguration};
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::new().with_abandoned(
    ///     AbandonedConfig::new()
    ///         .with_remove_on_borrow(true)
    ///         .with_timeout(Duration::ZERO),
    /// );
    ///
    /// let abandoned = config.abandoned.unwrap();
    /// assert!(abandoned.remove_abandoned_on_borrow);
    /// assert!(abandoned.remove_abandoned_timeout.is_zero());
    /// ```
    pub fn with_abandoned(mut self, abandoned: AbandonedConfig) -> Self {
        self.abandoned = Some(abandoned);
        self
    }

    /// Choose whether unknown returns are reported as errors
    pub fn with_fail_on_unknown_return(mut self, fail: bool) -> Self {
        self.fail_on_unknown_return = fail;
        self
    }

    /// Pre-populate the pool up to `min_idle` on creation
    pub fn with_warmup(mut self) -> Self {
        self.warmup = true;
        self
    }
}

/// Settings for reclaiming objects borrowers never returned
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AbandonedConfig {
    /// Scan for abandoned objects before serving each borrow
    pub remove_abandoned_on_borrow: bool,

    /// Scan for abandoned objects on every maintenance run
    pub remove_abandoned_on_maintenance: bool,

    /// Time since last use after which a borrowed object counts as
    /// abandoned. Zero makes every borrowed object eligible at once.
    pub remove_abandoned_timeout: Duration,

    /// Emit a warning, including the borrow site, for each reclaimed object
    pub log_abandoned: bool,
}

impl Default for AbandonedConfig {
    fn default() -> Self {
        Self {
            remove_abandoned_on_borrow: false,
            remove_abandoned_on_maintenance: false,
            remove_abandoned_timeout: Duration::from_secs(300),
            log_abandoned: false,
        }
    }
}

impl AbandonedConfig {
    /// Create reclamation settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Reap abandoned objects before each borrow
    pub fn with_remove_on_borrow(mut self, enabled: bool) -> Self {
        self.remove_abandoned_on_borrow = enabled;
        self
    }

    /// Reap abandoned objects on each maintenance run
    pub fn with_remove_on_maintenance(mut self, enabled: bool) -> Self {
        self.remove_abandoned_on_maintenance = enabled;
        self
    }

    /// Set time since last use after which an object is abandoned
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.remove_abandoned_timeout = timeout;
        self
    }

    /// Log each reclaimed object with its borrow site
    pub fn with_log_abandoned(mut self, enabled: bool) -> Self {
        self.log_abandoned = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_capacity() {
        let config = PoolConfiguration::new().with_max_total(0);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_min_idle_above_max_idle() {
        let config = PoolConfiguration::new().with_max_idle(2).with_min_idle(3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_period_disables_maintenance() {
        let config = PoolConfiguration::new().with_eviction_interval(Duration::ZERO);
        assert_eq!(config.eviction_interval(), None);

        let config = PoolConfiguration::new().with_eviction_interval(Duration::from_millis(10));
        assert_eq!(config.eviction_interval(), Some(Duration::from_millis(10)));
    }
}
