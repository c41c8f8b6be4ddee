//! Async usage examples

use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== GenericObjectPool - Async Examples ===\n");

    // Example 1: Async borrow
    async_borrow().await;

    // Example 2: Async with timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn async_borrow() {
    println!("1. Async Borrow:");
    let pool = GenericObjectPool::new(FnFactory::new(|| 7), PoolConfiguration::default()).unwrap();

    {
        let obj = pool.borrow_object_async().await.unwrap();
        println!("   Got object asynchronously: {}", *obj);
    }

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");

    let config = PoolConfiguration::new()
        .with_max_total(1)
        .with_max_wait(Duration::from_millis(100));
    let pool = GenericObjectPool::new(FnFactory::new(|| 42), config).unwrap();

    // Hold the only object
    let _obj = pool.borrow_object().unwrap();

    // Try to borrow another (should time out)
    match pool.borrow_object_async().await {
        Ok(_) => println!("   Got object"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let next = AtomicU32::new(0);
    let pool = GenericObjectPool::new(
        FnFactory::new(move || next.fetch_add(1, Ordering::Relaxed)),
        PoolConfiguration::new()
            .with_max_total(3)
            .with_max_wait(Duration::from_secs(5)),
    )
    .unwrap();

    let mut handles = vec![];
    for task in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let obj = pool.borrow_object_async().await.unwrap();
            sleep(Duration::from_millis(10)).await;
            println!("   Task {} used object {}", task, *obj);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let metrics = pool.get_metrics();
    println!(
        "   {} borrows served by {} objects\n",
        metrics.borrowed_count, metrics.created_count
    );
}
