//! Basic usage examples for GenericObjectPool

use generic_objectpool::{
    BoxError, FnFactory, GenericObjectPool, ObjectFactory, PoolConfiguration, PoolError,
};
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== GenericObjectPool - Basic Examples ===\n");

    // Example 1: Closure factory
    simple_pool();

    // Example 2: Factory with lifecycle hooks
    lifecycle_hooks();

    // Example 3: Try and timed borrows
    try_methods();

    // Example 4: Metrics and health
    metrics_and_health();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = GenericObjectPool::new(
        FnFactory::new(|| Vec::<u8>::with_capacity(4096)),
        PoolConfiguration::new().with_max_total(4),
    )
    .unwrap();

    {
        let mut buffer = pool.borrow_object().unwrap();
        buffer.extend_from_slice(b"payload");
        println!("   Borrowed buffer #{} with {} bytes", buffer.id(), buffer.len());
        // Object automatically returned when dropped
    }

    println!("   Idle after return: {}\n", pool.idle_count());
}

/// Hands out scratch strings and clears them on return.
struct ScratchFactory;

impl ObjectFactory for ScratchFactory {
    type Object = String;

    fn create(&self) -> Result<String, BoxError> {
        Ok(String::with_capacity(256))
    }

    fn validate(&self, object: &String) -> bool {
        object.capacity() <= 1024
    }

    fn passivate(&self, object: &mut String) -> Result<(), BoxError> {
        object.clear();
        Ok(())
    }
}

fn lifecycle_hooks() {
    println!("2. Lifecycle Hooks:");
    let pool =
        GenericObjectPool::new(ScratchFactory, PoolConfiguration::new().with_max_total(2)).unwrap();

    {
        let mut scratch = pool.borrow_object().unwrap();
        scratch.push_str("temporary");
    }
    let scratch = pool.borrow_object().unwrap();
    println!("   Reused scratch is empty: {}", scratch.is_empty());
    drop(scratch);

    {
        // Grows past the validation limit, so it is destroyed on return.
        let mut scratch = pool.borrow_object().unwrap();
        scratch.push_str(&"x".repeat(2048));
    }
    println!(
        "   Created: {}, destroyed: {}\n",
        pool.created_count(),
        pool.destroyed_count()
    );
}

fn try_methods() {
    println!("3. Try Methods:");
    let config = PoolConfiguration::new().with_max_total(1);
    let pool = GenericObjectPool::new(FnFactory::new(|| 42), config).unwrap();

    let first = pool.try_borrow_object();
    assert!(first.is_some());
    println!("   First try: Success");

    assert!(pool.try_borrow_object().is_none());
    println!("   Second try: None (pool exhausted)");

    match pool.borrow_object_timeout(Duration::from_millis(50)) {
        Err(PoolError::Exhausted { waited }) => {
            println!("   Timed borrow gave up after {:?}", waited)
        }
        other => println!("   Unexpected: {:?}", other.map(|obj| *obj)),
    }

    drop(first);
    assert!(pool.try_borrow_object().is_some());
    println!("   Third try: Success\n");
}

fn metrics_and_health() {
    println!("4. Metrics and Health:");
    let config = PoolConfiguration::new().with_max_total(5);
    let pool = GenericObjectPool::new(FnFactory::new(|| 0u64), config).unwrap();

    let held: Vec<_> = (0..3).map(|_| pool.borrow_object().unwrap()).collect();
    let metrics = pool.get_metrics();
    println!("   Borrowed: {}", metrics.borrowed_count);
    println!("   Utilization: {:.0}%", metrics.utilization * 100.0);
    drop(held);

    let health = pool.get_health_status();
    println!("   Healthy: {}", health.is_healthy());
    println!("   Available: {}", health.available_objects);

    println!("\n   Prometheus export:");
    for line in pool.export_metrics_prometheus("demo", None).lines().take(6) {
        println!("   {}", line);
    }
}
