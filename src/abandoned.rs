//! Reclaiming objects that borrowers hold without using

use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::AbandonedConfig;
use crate::factory::ObjectFactory;
use crate::pool::PoolInner;

impl<F: ObjectFactory> PoolInner<F> {
    /// Reap before a borrow when the pool is configured to.
    pub(crate) fn reap_on_borrow(&self) {
        if let Some(abandoned) = &self.config.abandoned {
            if abandoned.remove_abandoned_on_borrow {
                self.remove_abandoned(abandoned);
            }
        }
    }

    /// Stop tracking every borrowed object unused for at least the
    /// configured timeout and free its capacity.
    ///
    /// The borrower keeps the payload; it is destroyed when it comes back.
    pub(crate) fn remove_abandoned(&self, config: &AbandonedConfig) -> usize {
        let now = Instant::now();
        let reclaimed = {
            let mut state = self.state.lock();
            if state.closed {
                return 0;
            }
            let reclaimed = state
                .active
                .take_abandoned(config.remove_abandoned_timeout, now);
            if !reclaimed.is_empty() {
                self.release_capacity(&mut state);
            }
            reclaimed
        };

        for info in &reclaimed {
            self.metrics.abandoned.fetch_add(1, Ordering::Relaxed);
            let unused_ms = info.unused_time(now).as_millis() as u64;
            if config.log_abandoned {
                let borrowed_from = info
                    .borrowed_from
                    .map(|location| location.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                warn!(
                    entry_id = info.id,
                    borrowed_from = %borrowed_from,
                    unused_ms,
                    borrow_count = info.borrow_count,
                    "Reclaimed abandoned object"
                );
            } else {
                debug!(entry_id = info.id, unused_ms, "Reclaimed abandoned object");
            }
        }
        reclaimed.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{AbandonedConfig, PoolConfiguration};
    use crate::errors::PoolError;
    use crate::factory::{BoxError, FnFactory, ObjectFactory};
    use crate::pool::GenericObjectPool;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type SevenFactory = FnFactory<fn() -> u32>;

    fn pool(abandoned: AbandonedConfig) -> GenericObjectPool<SevenFactory> {
        GenericObjectPool::new(
            FnFactory::new((|| 7u32) as fn() -> u32),
            PoolConfiguration::new()
                .with_max_total(2)
                .with_max_wait(Duration::from_millis(20))
                .with_abandoned(abandoned),
        )
        .unwrap()
    }

    #[test]
    fn test_reap_on_borrow_frees_capacity() {
        let pool = pool(
            AbandonedConfig::new()
                .with_remove_on_borrow(true)
                .with_timeout(Duration::ZERO)
                .with_log_abandoned(true),
        );
        let _a = pool.borrow_object().unwrap();
        let _b = pool.borrow_object().unwrap();

        // Every borrow reclaims the holders before it.
        let _c = pool.borrow_object().unwrap();
        assert_eq!(pool.get_metrics().abandoned_count, 2);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_recent_use_is_not_abandoned() {
        let pool = pool(
            AbandonedConfig::new()
                .with_remove_on_borrow(true)
                .with_timeout(Duration::from_secs(5)),
        );
        let _a = pool.borrow_object().unwrap();
        let _b = pool.borrow_object().unwrap();

        assert!(matches!(pool.borrow_object(), Err(PoolError::Exhausted { .. })));
        assert_eq!(pool.remove_abandoned(), 0);
    }

    #[test]
    fn test_mark_used_postpones_reclaim() {
        let pool = pool(AbandonedConfig::new().with_timeout(Duration::from_millis(100)));
        let held = pool.borrow_object().unwrap();

        std::thread::sleep(Duration::from_millis(60));
        held.mark_used();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(pool.remove_abandoned(), 0);

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(pool.remove_abandoned(), 1);
        assert_eq!(pool.total_count(), 0);
    }

    #[test]
    fn test_disabled_without_config() {
        let pool =
            GenericObjectPool::new(FnFactory::new(|| 0u8), PoolConfiguration::new()).unwrap();
        let _held = pool.borrow_object().unwrap();
        assert_eq!(pool.remove_abandoned(), 0);
        assert_eq!(pool.active_count(), 1);
    }

    /// Every teardown fails.
    #[derive(Default)]
    struct StuckFactory {
        destroy_calls: Arc<AtomicUsize>,
    }

    impl ObjectFactory for StuckFactory {
        type Object = u32;

        fn create(&self) -> Result<u32, BoxError> {
            Ok(1)
        }

        fn destroy(&self, _object: u32) -> Result<(), BoxError> {
            self.destroy_calls.fetch_add(1, Ordering::Relaxed);
            Err("handle leaked".into())
        }
    }

    #[test]
    fn test_failed_destroy_after_reclaim_keeps_pool_usable() {
        let factory = StuckFactory::default();
        let destroy_calls = Arc::clone(&factory.destroy_calls);
        let pool = GenericObjectPool::new(
            factory,
            PoolConfiguration::new()
                .with_max_total(1)
                .with_abandoned(AbandonedConfig::new().with_timeout(Duration::ZERO)),
        )
        .unwrap();

        let stale = pool.borrow_object().unwrap();
        assert_eq!(pool.remove_abandoned(), 1);
        assert_eq!(pool.total_count(), 0);

        drop(stale);
        assert_eq!(destroy_calls.load(Ordering::Relaxed), 1);
        assert_eq!(pool.destroyed_count(), 1);
        assert!(pool.borrow_object().is_ok());
    }
}
