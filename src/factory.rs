//! Object factory contract consumed by the pool

use std::fmt;

/// Boxed error returned by factory hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates, checks and tears down the objects a pool lends out.
///
/// Only [`create`](ObjectFactory::create) is required. The remaining hooks
/// default to no-ops that accept every object.
///
/// # Examples
///
/// ```
/// use generic_objectpool::{BoxError, ObjectFactory};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Sequence {
///     next: AtomicUsize,
/// }
///
/// impl ObjectFactory for Sequence {
///     type Object = usize;
///
///     fn create(&self) -> Result<usize, BoxError> {
///         Ok(self.next.fetch_add(1, Ordering::Relaxed))
///     }
/// }
///
/// let factory = Sequence { next: AtomicUsize::new(1) };
/// assert_eq!(factory.create().unwrap(), 1);
/// assert!(factory.validate(&1));
/// ```
pub trait ObjectFactory: Send + Sync + 'static {
    /// The pooled object type.
    type Object: Send + 'static;

    /// Build a new object.
    fn create(&self) -> Result<Self::Object, BoxError>;

    /// Release everything the object holds. Called exactly once per object.
    fn destroy(&self, object: Self::Object) -> Result<(), BoxError> {
        drop(object);
        Ok(())
    }

    /// Report whether the object is still usable.
    fn validate(&self, _object: &Self::Object) -> bool {
        true
    }

    /// Prepare an idle object before it is handed to a borrower.
    fn activate(&self, _object: &mut Self::Object) -> Result<(), BoxError> {
        Ok(())
    }

    /// Reset a returned object before it goes back to the idle registry.
    fn passivate(&self, _object: &mut Self::Object) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Factory built from a closure.
///
/// ```
/// use generic_objectpool::{FnFactory, ObjectFactory};
///
/// let factory = FnFactory::new(|| String::from("buffer"));
/// assert_eq!(factory.create().unwrap(), "buffer");
/// ```
pub struct FnFactory<F> {
    make: F,
}

impl<F> FnFactory<F> {
    /// Wrap a closure that builds one object per call
    pub fn new(make: F) -> Self {
        Self { make }
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").finish_non_exhaustive()
    }
}

impl<F, T> ObjectFactory for FnFactory<F>
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    type Object = T;

    fn create(&self) -> Result<T, BoxError> {
        Ok((self.make)())
    }
}
