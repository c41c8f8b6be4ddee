//! End-to-end scenarios for a small integer pool with abandoned-object reclamation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use generic_objectpool::{
    AbandonedConfig, BoxError, GenericObjectPool, ObjectFactory, PoolConfiguration, PoolError,
};

/// Sequence factory owning its counter, so every pool starts from 1.
#[derive(Default)]
struct IntegerFactory {
    next: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
}

impl ObjectFactory for IntegerFactory {
    type Object = usize;

    fn create(&self) -> Result<usize, BoxError> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn destroy(&self, _object: usize) -> Result<(), BoxError> {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config() -> PoolConfiguration {
    PoolConfiguration::new()
        .with_max_total(5)
        .with_max_idle(5)
        .with_min_idle(1)
        .with_block_when_exhausted(true)
        .with_max_wait(Duration::from_millis(100))
        .with_eviction_interval(Duration::from_millis(10))
        .with_min_evictable_idle_time(Duration::from_millis(50))
        .with_num_tests_per_eviction_run(1)
}

fn reaping(timeout: Duration) -> PoolConfiguration {
    config().with_abandoned(
        AbandonedConfig::new()
            .with_remove_on_borrow(true)
            .with_remove_on_maintenance(true)
            .with_timeout(timeout)
            .with_log_abandoned(true),
    )
}

#[test]
fn borrow_and_return_pairs_balance() {
    let pool = GenericObjectPool::new(IntegerFactory::default(), config()).unwrap();

    for _ in 0..100 {
        let obj = pool.borrow_object().unwrap();
        assert!(*obj > 0);
        pool.return_object(obj).unwrap();
    }

    assert_eq!(pool.borrowed_count(), 100);
    assert_eq!(pool.returned_count(), 100);
    assert!(pool.total_count() <= 5);
}

#[test]
fn sixth_borrow_is_exhausted_after_max_wait() {
    let pool = GenericObjectPool::new(IntegerFactory::default(), config()).unwrap();
    let held: Vec<_> = (0..5).map(|_| pool.borrow_object().unwrap()).collect();

    let started = Instant::now();
    let err = pool.borrow_object().unwrap_err();
    assert!(matches!(err, PoolError::Exhausted { .. }));
    assert!(err.is_retryable());
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(held.len(), 5);
}

#[test]
fn zero_timeout_reclaims_abandoned_objects() {
    let pool = GenericObjectPool::new(IntegerFactory::default(), reaping(Duration::ZERO)).unwrap();
    let _held: Vec<_> = (0..5).map(|_| pool.borrow_object().unwrap()).collect();

    thread::sleep(Duration::from_millis(200));
    let obj = pool.borrow_object().unwrap();
    assert!(*obj > 0);
    assert!(pool.get_metrics().abandoned_count >= 5);
    assert!(pool.total_count() <= 5);
}

#[test]
fn long_timeout_keeps_borrowed_objects() {
    let pool =
        GenericObjectPool::new(IntegerFactory::default(), reaping(Duration::from_secs(5))).unwrap();
    let _held: Vec<_> = (0..5).map(|_| pool.borrow_object().unwrap()).collect();

    thread::sleep(Duration::from_millis(200));
    assert!(matches!(pool.borrow_object(), Err(PoolError::Exhausted { .. })));
    assert_eq!(pool.get_metrics().abandoned_count, 0);
    assert_eq!(pool.active_count(), 5);
}

#[test]
fn maintenance_thread_reclaims_without_a_borrow() {
    let pool = GenericObjectPool::new(
        IntegerFactory::default(),
        config().with_abandoned(
            AbandonedConfig::new()
                .with_remove_on_maintenance(true)
                .with_timeout(Duration::from_millis(20)),
        ),
    )
    .unwrap();
    let _held: Vec<_> = (0..5).map(|_| pool.borrow_object().unwrap()).collect();

    // Several eviction periods pass with no borrow and no manual sweep.
    thread::sleep(Duration::from_millis(200));
    assert_eq!(pool.get_metrics().abandoned_count, 5);
    assert_eq!(pool.active_count(), 0);
    assert!(pool.total_count() <= 5);
}

#[test]
fn reclaimed_object_is_destroyed_once_on_return() {
    let factory = IntegerFactory::default();
    let destroyed = Arc::clone(&factory.destroyed);
    let pool = GenericObjectPool::new(
        factory,
        PoolConfiguration::new()
            .with_max_total(1)
            .with_abandoned(AbandonedConfig::new().with_timeout(Duration::ZERO)),
    )
    .unwrap();

    let stale = pool.borrow_object().unwrap();
    assert_eq!(pool.remove_abandoned(), 1);
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);

    assert!(matches!(pool.return_object(stale), Err(PoolError::UnknownObject)));
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.returned_count(), 0);
}

#[test]
fn abandoned_slot_wakes_blocked_borrower() {
    let pool = GenericObjectPool::new(
        IntegerFactory::default(),
        PoolConfiguration::new()
            .with_max_total(1)
            .with_max_wait(Duration::from_secs(5))
            .with_abandoned(AbandonedConfig::new().with_timeout(Duration::ZERO)),
    )
    .unwrap();
    let _stale = pool.borrow_object().unwrap();

    let waiter = {
        let pool = pool.clone();
        thread::spawn(move || pool.borrow_object().map(|obj| *obj))
    };
    while pool.waiter_count() == 0 {
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(pool.remove_abandoned(), 1);
    assert_eq!(waiter.join().unwrap().unwrap(), 2);
}

#[test]
fn close_rejects_borrowers() {
    let pool = GenericObjectPool::new(IntegerFactory::default(), config()).unwrap();
    drop(pool.borrow_object().unwrap());

    pool.close();
    assert!(pool.is_closed());
    assert!(matches!(pool.borrow_object(), Err(PoolError::Closed)));
    assert_eq!(pool.idle_count(), 0);
    assert!(!pool.get_health_status().is_healthy());
}
