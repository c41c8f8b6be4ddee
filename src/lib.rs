//! # generic_objectpool
//!
//! Bounded, thread-safe object pool for Rust. A factory builds objects on
//! demand; the pool lends them out, takes them back, evicts idle ones and
//! reclaims objects that borrowers hold without using.
//!
//! ## Features
//!
//! - Blocking, non-blocking, timed and async borrows with fair FIFO waiting
//! - Automatic return of objects via RAII (Drop trait)
//! - Factory lifecycle hooks: create, destroy, validate, activate, passivate
//! - LIFO or FIFO idle ordering, `max_idle` / `min_idle` sizing
//! - Background eviction with hard and soft idle limits
//! - Abandoned-object detection on borrow and on maintenance, with the
//!   borrow call site in the log
//! - Metrics, Prometheus export and health status
//!
//! ## Quick Start
//!
//! ```rust
//! use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
//!
//! let pool = GenericObjectPool::new(
//!     FnFactory::new(|| String::with_capacity(64)),
//!     PoolConfiguration::new().with_max_total(2),
//! )
//! .unwrap();
//!
//! {
//!     let mut buffer = pool.borrow_object().unwrap();
//!     buffer.push_str("hello");
//!     // Object automatically returned when `buffer` goes out of scope
//! }
//!
//! assert_eq!(pool.idle_count(), 1);
//! ```

mod abandoned;
mod active;
mod config;
mod entry;
mod errors;
mod eviction;
mod factory;
mod health;
mod idle;
mod metrics;
mod pool;
mod waiters;

pub use config::{AbandonedConfig, PoolConfiguration};
pub use entry::{EntryInfo, EntryState};
pub use errors::{FactoryOperation, PoolError, PoolResult};
pub use eviction::EvictionPolicy;
pub use factory::{BoxError, FnFactory, ObjectFactory};
pub use health::HealthStatus;
#[cfg(feature = "metrics")]
pub use metrics::PoolCollector;
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::{GenericObjectPool, PooledObject};
