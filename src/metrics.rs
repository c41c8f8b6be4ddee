//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
///
/// let pool =
///     GenericObjectPool::new(FnFactory::new(|| 0u32), PoolConfiguration::default()).unwrap();
///
/// {
///     let _obj = pool.borrow_object().unwrap();
///     let metrics = pool.get_metrics();
///     assert_eq!(metrics.borrowed_count, 1);
///     assert_eq!(metrics.active_count, 1);
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolMetrics {
    /// Successful borrows
    pub borrowed_count: usize,

    /// Borrowed objects that came back
    pub returned_count: usize,

    /// Objects built by the factory
    pub created_count: usize,

    /// Objects handed to the factory for destruction
    pub destroyed_count: usize,

    /// Idle objects destroyed by the eviction sweep
    pub destroyed_by_evictor_count: usize,

    /// Idle objects destroyed because they failed validation on borrow
    pub destroyed_by_borrow_validation_count: usize,

    /// Borrowed objects reclaimed as abandoned
    pub abandoned_count: usize,

    /// Borrows that failed because the pool was exhausted
    pub exhausted_count: usize,

    /// Failed validations on borrow or return
    pub validation_failures: usize,

    /// Returns of objects the pool no longer tracked
    pub unknown_returns: usize,

    /// Current idle objects
    pub idle_count: usize,

    /// Current borrowed objects
    pub active_count: usize,

    /// Objects accounted for, including those being created
    pub total_count: usize,

    /// Borrowers currently waiting
    pub waiter_count: usize,

    /// How long the oldest waiter has been waiting
    pub longest_wait: Duration,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    /// Maximum pool capacity
    pub max_total: usize,

    pub closed: bool,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("borrowed_count".to_string(), self.borrowed_count.to_string());
        metrics.insert("returned_count".to_string(), self.returned_count.to_string());
        metrics.insert("created_count".to_string(), self.created_count.to_string());
        metrics.insert("destroyed_count".to_string(), self.destroyed_count.to_string());
        metrics.insert(
            "destroyed_by_evictor_count".to_string(),
            self.destroyed_by_evictor_count.to_string(),
        );
        metrics.insert(
            "destroyed_by_borrow_validation_count".to_string(),
            self.destroyed_by_borrow_validation_count.to_string(),
        );
        metrics.insert("abandoned_count".to_string(), self.abandoned_count.to_string());
        metrics.insert("exhausted_count".to_string(), self.exhausted_count.to_string());
        metrics.insert("validation_failures".to_string(), self.validation_failures.to_string());
        metrics.insert("unknown_returns".to_string(), self.unknown_returns.to_string());
        metrics.insert("idle_count".to_string(), self.idle_count.to_string());
        metrics.insert("active_count".to_string(), self.active_count.to_string());
        metrics.insert("total_count".to_string(), self.total_count.to_string());
        metrics.insert("waiter_count".to_string(), self.waiter_count.to_string());
        metrics.insert(
            "longest_wait_ms".to_string(),
            self.longest_wait.as_millis().to_string(),
        );
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_total".to_string(), self.max_total.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool =
    ///     GenericObjectPool::new(FnFactory::new(|| 0u32), PoolConfiguration::default()).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("my_pool", Some(&tags));
    /// assert!(output.contains("objectpool_objects_active"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        let gauges = [
            ("objectpool_objects_active", "Current borrowed objects", metrics.active_count),
            ("objectpool_objects_idle", "Current idle objects", metrics.idle_count),
            ("objectpool_objects_total", "Objects accounted for by the pool", metrics.total_count),
            ("objectpool_waiters", "Borrowers currently waiting", metrics.waiter_count),
        ];
        for (name, help, value) in gauges {
            Self::push_metric(&mut output, name, help, "gauge", &labels, &value.to_string());
        }
        Self::push_metric(
            &mut output,
            "objectpool_utilization",
            "Pool utilization ratio",
            "gauge",
            &labels,
            &format!("{:.2}", metrics.utilization),
        );

        let counters = [
            ("objectpool_borrowed_total", "Total successful borrows", metrics.borrowed_count),
            ("objectpool_returned_total", "Total returned objects", metrics.returned_count),
            ("objectpool_created_total", "Total created objects", metrics.created_count),
            ("objectpool_destroyed_total", "Total destroyed objects", metrics.destroyed_count),
            (
                "objectpool_evicted_total",
                "Idle objects evicted",
                metrics.destroyed_by_evictor_count,
            ),
            (
                "objectpool_abandoned_total",
                "Objects reclaimed as abandoned",
                metrics.abandoned_count,
            ),
            ("objectpool_exhausted_total", "Borrows failed on exhaustion", metrics.exhausted_count),
            (
                "objectpool_validation_failures_total",
                "Validation failures",
                metrics.validation_failures,
            ),
        ];
        for (name, help, value) in counters {
            Self::push_metric(&mut output, name, help, "counter", &labels, &value.to_string());
        }

        output
    }

    fn push_metric(
        output: &mut String,
        name: &str,
        help: &str,
        kind: &str,
        labels: &str,
        value: &str,
    ) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Point-in-time registry sizes read under the pool lock.
pub(crate) struct PoolGauges {
    pub idle: usize,
    pub active: usize,
    pub total: usize,
    pub waiters: usize,
    pub longest_wait: Duration,
    pub max_total: usize,
    pub closed: bool,
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub borrowed: AtomicUsize,
    pub returned: AtomicUsize,
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub evicted: AtomicUsize,
    pub destroyed_by_borrow_validation: AtomicUsize,
    pub abandoned: AtomicUsize,
    pub exhausted: AtomicUsize,
    pub validation_failures: AtomicUsize,
    pub unknown_returns: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, gauges: PoolGauges) -> PoolMetrics {
        let utilization = if gauges.max_total > 0 {
            gauges.active as f64 / gauges.max_total as f64
        } else {
            0.0
        };

        PoolMetrics {
            borrowed_count: self.borrowed.load(Ordering::Relaxed),
            returned_count: self.returned.load(Ordering::Relaxed),
            created_count: self.created.load(Ordering::Relaxed),
            destroyed_count: self.destroyed.load(Ordering::Relaxed),
            destroyed_by_evictor_count: self.evicted.load(Ordering::Relaxed),
            destroyed_by_borrow_validation_count: self
                .destroyed_by_borrow_validation
                .load(Ordering::Relaxed),
            abandoned_count: self.abandoned.load(Ordering::Relaxed),
            exhausted_count: self.exhausted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            unknown_returns: self.unknown_returns.load(Ordering::Relaxed),
            idle_count: gauges.idle,
            active_count: gauges.active,
            total_count: gauges.total,
            waiter_count: gauges.waiters,
            longest_wait: gauges.longest_wait,
            utilization,
            max_total: gauges.max_total,
            closed: gauges.closed,
        }
    }
}

#[cfg(feature = "metrics")]
pub use self::collector::PoolCollector;

#[cfg(feature = "metrics")]
mod collector {
    use super::PoolMetrics;
    use prometheus::core::{Collector, Desc};
    use prometheus::proto::MetricFamily;
    use prometheus::{IntCounter, IntGauge, Opts};

    type Snapshot = Box<dyn Fn() -> PoolMetrics + Send + Sync>;

    /// Prometheus collector reading a fresh snapshot on every scrape
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
    ///
    /// let pool =
    ///     GenericObjectPool::new(FnFactory::new(|| 0u32), PoolConfiguration::default()).unwrap();
    /// let registry = prometheus::Registry::new();
    /// registry.register(Box::new(pool.collector("workers").unwrap())).unwrap();
    ///
    /// drop(pool.borrow_object().unwrap());
    /// let families = registry.gather();
    /// assert!(families.iter().any(|f| f.get_name() == "objectpool_borrowed_total"));
    /// ```
    pub struct PoolCollector {
        snapshot: Snapshot,
        active: IntGauge,
        idle: IntGauge,
        waiters: IntGauge,
        borrowed: IntCounter,
        returned: IntCounter,
        created: IntCounter,
        destroyed: IntCounter,
        abandoned: IntCounter,
        exhausted: IntCounter,
    }

    impl PoolCollector {
        pub(crate) fn new(pool_name: &str, snapshot: Snapshot) -> prometheus::Result<Self> {
            let opts =
                |name: &str, help: &str| Opts::new(name, help).const_label("pool", pool_name);
            let gauge = |name: &str, help: &str| IntGauge::with_opts(opts(name, help));
            let counter = |name: &str, help: &str| IntCounter::with_opts(opts(name, help));
            Ok(Self {
                snapshot,
                active: gauge("objectpool_objects_active", "Current borrowed objects")?,
                idle: gauge("objectpool_objects_idle", "Current idle objects")?,
                waiters: gauge("objectpool_waiters", "Borrowers currently waiting")?,
                borrowed: counter("objectpool_borrowed_total", "Total successful borrows")?,
                returned: counter("objectpool_returned_total", "Total returned objects")?,
                created: counter("objectpool_created_total", "Total created objects")?,
                destroyed: counter("objectpool_destroyed_total", "Total destroyed objects")?,
                abandoned: counter("objectpool_abandoned_total", "Objects reclaimed as abandoned")?,
                exhausted: counter("objectpool_exhausted_total", "Borrows failed on exhaustion")?,
            })
        }

        fn gauges(&self) -> [&IntGauge; 3] {
            [&self.active, &self.idle, &self.waiters]
        }

        fn counters(&self) -> [&IntCounter; 6] {
            [
                &self.borrowed,
                &self.returned,
                &self.created,
                &self.destroyed,
                &self.abandoned,
                &self.exhausted,
            ]
        }
    }

    /// Counters only move forward, so bring them up to the snapshot value.
    fn advance(counter: &IntCounter, value: usize) {
        let current = counter.get();
        let value = value as u64;
        if value > current {
            counter.inc_by(value - current);
        }
    }

    impl Collector for PoolCollector {
        fn desc(&self) -> Vec<&Desc> {
            let mut descs = Vec::new();
            for gauge in self.gauges() {
                descs.extend(gauge.desc());
            }
            for counter in self.counters() {
                descs.extend(counter.desc());
            }
            descs
        }

        fn collect(&self) -> Vec<MetricFamily> {
            let metrics = (self.snapshot)();
            self.active.set(metrics.active_count as i64);
            self.idle.set(metrics.idle_count as i64);
            self.waiters.set(metrics.waiter_count as i64);
            advance(&self.borrowed, metrics.borrowed_count);
            advance(&self.returned, metrics.returned_count);
            advance(&self.created, metrics.created_count);
            advance(&self.destroyed, metrics.destroyed_count);
            advance(&self.abandoned, metrics.abandoned_count);
            advance(&self.exhausted, metrics.exhausted_count);

            let mut families = Vec::new();
            for gauge in self.gauges() {
                families.extend(gauge.collect());
            }
            for counter in self.counters() {
                families.extend(counter.collect());
            }
            families
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolMetrics {
        MetricsTracker::new().snapshot(PoolGauges {
            idle: 1,
            active: 3,
            total: 4,
            waiters: 2,
            longest_wait: Duration::from_millis(15),
            max_total: 4,
            closed: false,
        })
    }

    #[test]
    fn test_snapshot_utilization() {
        let metrics = sample();
        assert_eq!(metrics.utilization, 0.75);
        assert_eq!(metrics.total_count, 4);
    }

    #[test]
    fn test_export_map() {
        let exported = sample().export();
        assert_eq!(exported["active_count"], "3");
        assert_eq!(exported["longest_wait_ms"], "15");
        assert_eq!(exported["utilization"], "0.75");
    }

    #[test]
    fn test_prometheus_text() {
        let output = MetricsExporter::export_prometheus(&sample(), "db", None);
        assert!(output.contains("# TYPE objectpool_waiters gauge"));
        assert!(output.contains("objectpool_waiters{pool=\"db\"} 2"));
        assert!(output.contains("# TYPE objectpool_abandoned_total counter"));
    }
}
