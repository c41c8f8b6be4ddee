//! Health monitoring for object pools

use crate::metrics::PoolMetrics;

/// Utilization above which the pool is reported unhealthy
const UNHEALTHY_UTILIZATION: f64 = 0.9;

/// Health status of an object pool
///
/// # Examples
///
/// ```
/// use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
///
/// let pool = GenericObjectPool::new(
///     FnFactory::new(|| 0u32),
///     PoolConfiguration::new().with_max_total(3),
/// )
/// .unwrap();
/// pool.add_object().unwrap();
///
/// let health = pool.get_health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.available_objects, 1);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Current pool utilization (0.0 to 1.0)
    pub utilization: f64,

    /// Idle objects ready to lend
    pub available_objects: usize,

    /// Borrowed objects
    pub active_objects: usize,

    /// Borrowers currently waiting
    pub waiting_borrowers: usize,

    /// Total capacity
    pub total_capacity: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Assess a metrics snapshot
    pub fn from_metrics(metrics: &PoolMetrics) -> Self {
        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if metrics.closed {
            warnings.push("Pool is closed".to_string());
            is_healthy = false;
        }

        if metrics.utilization > UNHEALTHY_UTILIZATION {
            warnings.push(format!(
                "High utilization: {:.1}%",
                metrics.utilization * 100.0
            ));
            is_healthy = false;
        }

        if metrics.waiter_count > 0 {
            warnings.push(format!(
                "{} borrower(s) waiting, longest for {:?}",
                metrics.waiter_count, metrics.longest_wait
            ));
        }

        if metrics.abandoned_count > 0 {
            warnings.push(format!(
                "{} abandoned object(s) reclaimed",
                metrics.abandoned_count
            ));
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization: metrics.utilization,
            available_objects: metrics.idle_count,
            active_objects: metrics.active_count,
            waiting_borrowers: metrics.waiter_count,
            total_capacity: metrics.max_total,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricsTracker, PoolGauges};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn metrics(active: usize, waiters: usize, closed: bool) -> PoolMetrics {
        MetricsTracker::new().snapshot(PoolGauges {
            idle: 10 - active,
            active,
            total: 10,
            waiters,
            longest_wait: Duration::from_millis(5),
            max_total: 10,
            closed,
        })
    }

    #[test]
    fn test_quiet_pool_is_healthy() {
        let health = HealthStatus::from_metrics(&metrics(2, 0, false));
        assert!(health.is_healthy());
        assert_eq!(health.warning_count, 0);
        assert_eq!(health.available_objects, 8);
    }

    #[test]
    fn test_saturated_pool_is_unhealthy() {
        let health = HealthStatus::from_metrics(&metrics(10, 3, false));
        assert!(!health.is_healthy());
        assert_eq!(health.warning_count, 2);
        assert!(health.warnings[1].contains("3 borrower(s) waiting"));
    }

    #[test]
    fn test_closed_pool_is_unhealthy() {
        let health = HealthStatus::from_metrics(&metrics(0, 0, true));
        assert!(!health.is_healthy());
        assert_eq!(health.warnings, vec!["Pool is closed".to_string()]);
    }

    #[test]
    fn test_abandoned_reclaims_warn() {
        let tracker = MetricsTracker::new();
        tracker.abandoned.fetch_add(2, Ordering::Relaxed);
        let snapshot = tracker.snapshot(PoolGauges {
            idle: 0,
            active: 0,
            total: 0,
            waiters: 0,
            longest_wait: Duration::ZERO,
            max_total: 4,
            closed: false,
        });

        let health = HealthStatus::from_metrics(&snapshot);
        assert!(health.is_healthy());
        assert_eq!(health.warnings, vec!["2 abandoned object(s) reclaimed".to_string()]);
    }
}
