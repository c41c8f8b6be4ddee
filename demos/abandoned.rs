//! Abandoned-object reclamation and background eviction

use generic_objectpool::{AbandonedConfig, FnFactory, GenericObjectPool, PoolConfiguration};
use std::thread;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .init();

    println!("=== GenericObjectPool - Abandoned Objects ===\n");

    let config = PoolConfiguration::new()
        .with_max_total(2)
        .with_min_idle(1)
        .with_max_wait(Duration::from_millis(100))
        .with_eviction_interval(Duration::from_millis(20))
        .with_min_evictable_idle_time(Duration::from_millis(50))
        .with_abandoned(
            AbandonedConfig::new()
                .with_remove_on_maintenance(true)
                .with_timeout(Duration::from_millis(100))
                .with_log_abandoned(true),
        );
    let pool = GenericObjectPool::new(FnFactory::new(|| [0u8; 64]), config).unwrap();

    // Borrowed and forgotten: never used, never returned.
    let leaked: Vec<_> = (0..2).map(|_| pool.borrow_object().unwrap()).collect();
    println!("1. Pool exhausted: {}", pool.try_borrow_object().is_none());

    thread::sleep(Duration::from_millis(250));
    println!("2. Reclaimed: {}", pool.get_metrics().abandoned_count);

    let obj = pool.borrow_object().unwrap();
    println!("3. Borrow after reclaim: object #{}", obj.id());
    drop(obj);

    // Returning a reclaimed object is reported and the object destroyed.
    for stale in leaked {
        if let Err(err) = pool.return_object(stale) {
            println!("   Stale return: {}", err);
        }
    }

    pool.close();
    println!("\n{:#?}", pool.get_health_status());
}
