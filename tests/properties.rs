//! Property-based tests for pool accounting.

use proptest::prelude::*;

use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration, PooledObject};

#[derive(Debug, Clone)]
enum Op {
    Borrow,
    Return(usize),
    Invalidate(usize),
    Evict,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Borrow),
        4 => any::<usize>().prop_map(Op::Return),
        1 => any::<usize>().prop_map(Op::Invalidate),
        1 => Just(Op::Evict),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every borrow followed by a return keeps the counters balanced and
    /// the pool within capacity.
    #[test]
    fn counters_balance_and_capacity_holds(
        max_total in 1usize..6,
        max_idle in 0usize..6,
        lifo in any::<bool>(),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut config = PoolConfiguration::new()
            .with_max_total(max_total)
            .with_max_idle(max_idle)
            .with_block_when_exhausted(false);
        if !lifo {
            config = config.with_fifo();
        }
        let pool = GenericObjectPool::new(FnFactory::new(|| 0u32), config).unwrap();

        let mut held: Vec<PooledObject<u32>> = Vec::new();
        let mut invalidated = 0;
        for op in ops {
            match op {
                Op::Borrow => {
                    if let Some(obj) = pool.try_borrow_object() {
                        held.push(obj);
                    } else {
                        prop_assert_eq!(held.len(), max_total);
                    }
                }
                Op::Return(i) if !held.is_empty() => {
                    let obj = held.swap_remove(i % held.len());
                    prop_assert!(pool.return_object(obj).is_ok());
                }
                Op::Invalidate(i) if !held.is_empty() => {
                    let obj = held.swap_remove(i % held.len());
                    prop_assert!(pool.invalidate_object(obj).is_ok());
                    invalidated += 1;
                }
                Op::Evict => {
                    pool.evict();
                }
                _ => {}
            }

            prop_assert!(pool.total_count() <= max_total);
            prop_assert!(pool.idle_count() <= max_idle);
            prop_assert_eq!(pool.active_count(), held.len());
        }

        for obj in held.drain(..) {
            prop_assert!(pool.return_object(obj).is_ok());
        }
        prop_assert_eq!(pool.borrowed_count(), pool.returned_count() + invalidated);
        prop_assert_eq!(pool.active_count(), 0);
    }
}
