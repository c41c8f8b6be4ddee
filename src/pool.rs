//! Core object pool implementation

use crate::active::ActiveRegistry;
use crate::config::PoolConfiguration;
use crate::entry::{EntryInfo, PooledEntry};
use crate::errors::{FactoryOperation, PoolError, PoolResult};
use crate::eviction::Evictor;
use crate::factory::ObjectFactory;
use crate::health::HealthStatus;
use crate::idle::IdleRegistry;
#[cfg(feature = "metrics")]
use crate::metrics::PoolCollector;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolGauges, PoolMetrics};
use crate::waiters::{Grant, GrantSender, WaiterQueue};

use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// The pool side of a lent object.
pub(crate) trait Lender<T>: Send + Sync {
    /// Take the object back, destroying it if the pool no longer tracks it.
    fn release(&self, id: u64, payload: T);

    /// Refresh the object's last-used timestamp.
    fn touch(&self, id: u64);

    /// Stop tracking the object without taking it back.
    fn forget(&self, id: u64);
}

/// A borrowed object that automatically returns to the pool when dropped
pub struct PooledObject<T> {
    value: Option<T>,
    id: u64,
    lender: Arc<dyn Lender<T>>,
}

impl<T> PooledObject<T> {
    fn new(value: T, id: u64, lender: Arc<dyn Lender<T>>) -> Self {
        Self {
            value: Some(value),
            id,
            lender,
        }
    }

    /// Identifier of the pooled entry backing this object
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Record activity so the object is not reclaimed as abandoned.
    pub fn mark_used(&self) {
        self.lender.touch(self.id);
    }

    /// Take the inner value out of the pool for good.
    ///
    /// The pool stops counting the object and may create a replacement.
    pub fn detach(mut self) -> T {
        let value = self.value.take().expect("Value already taken");
        self.lender.forget(self.id);
        value
    }

    fn into_parts(mut self) -> (u64, T, Arc<dyn Lender<T>>) {
        let value = self.value.take().expect("Value already taken");
        (self.id, value, Arc::clone(&self.lender))
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.lender.release(self.id, value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}

/// Both registries, the waiter queue and the counters, under one lock.
pub(crate) struct PoolState<T> {
    pub idle: IdleRegistry<T>,
    pub active: ActiveRegistry,
    pub waiters: WaiterQueue<T>,
    /// Slots reserved for objects being created outside the lock
    pub creating: usize,
    pub closed: bool,
    next_id: u64,
}

impl<T> PoolState<T> {
    fn new(lifo: bool, capacity: usize) -> Self {
        Self {
            idle: IdleRegistry::new(lifo, capacity),
            active: ActiveRegistry::new(),
            waiters: WaiterQueue::new(),
            creating: 0,
            closed: false,
            next_id: 0,
        }
    }

    pub fn total_count(&self) -> usize {
        self.idle.len() + self.active.len() + self.creating
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Hand an idle entry straight to the oldest waiter, or give it back
    /// when nobody is waiting.
    fn offer(&mut self, entry: PooledEntry<T>) -> Option<PooledEntry<T>> {
        if self.waiters.is_empty() {
            return Some(entry);
        }

        let PooledEntry { info, payload } = entry;
        let id = info.id;
        self.active.insert_allocated(info);
        match self.waiters.deliver(Grant::Entry { id, payload }) {
            Ok(()) => None,
            Err(grant) => {
                let info = self.active.remove(id);
                if let (Grant::Entry { payload, .. }, Some(info)) = (grant, info) {
                    return Some(PooledEntry { info, payload });
                }
                unreachable!("undelivered grant must carry the offered entry")
            }
        }
    }
}

enum Claim<T, R> {
    Ready(Grant<T>),
    Wait { ticket: u64, rx: R },
}

pub(crate) struct PoolInner<F: ObjectFactory> {
    pub factory: F,
    pub config: PoolConfiguration,
    pub state: Mutex<PoolState<F::Object>>,
    pub metrics: MetricsTracker,
    evictor: Mutex<Option<Evictor>>,
}

impl<F: ObjectFactory> PoolInner<F> {
    fn borrow_blocking(
        self: &Arc<Self>,
        max_wait: Option<Duration>,
        location: &'static Location<'static>,
    ) -> PoolResult<PooledObject<F::Object>> {
        let started = Instant::now();
        let deadline = max_wait.and_then(|wait| started.checked_add(wait));
        self.reap_on_borrow();

        loop {
            let claim = self.claim(|| {
                let (tx, rx) = channel::bounded(1);
                (GrantSender::Blocking(tx), rx)
            })?;
            let grant = match claim {
                Claim::Ready(grant) => grant,
                Claim::Wait { ticket, rx } => self.wait_blocking(ticket, rx, deadline, started)?,
            };
            if let Some(object) = self.complete(grant, location)? {
                return Ok(object);
            }
        }
    }

    async fn borrow_async(
        self: &Arc<Self>,
        max_wait: Option<Duration>,
        location: &'static Location<'static>,
    ) -> PoolResult<PooledObject<F::Object>> {
        let started = Instant::now();
        let deadline = max_wait.and_then(|wait| started.checked_add(wait));
        self.reap_on_borrow();

        loop {
            let claim = self.claim(|| {
                let (tx, rx) = oneshot::channel();
                (GrantSender::Async(tx), rx)
            })?;
            let grant = match claim {
                Claim::Ready(grant) => grant,
                Claim::Wait { ticket, rx } => {
                    let mut pending = PendingGrant {
                        pool: self,
                        ticket,
                        rx: Some(rx),
                    };
                    pending.wait(deadline, started).await?
                }
            };
            if let Some(object) = self.complete(grant, location)? {
                return Ok(object);
            }
        }
    }

    /// Take an idle entry, reserve a creation slot, or queue a ticket.
    fn claim<R>(
        &self,
        channel: impl FnOnce() -> (GrantSender<F::Object>, R),
    ) -> PoolResult<Claim<F::Object, R>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PoolError::Closed);
        }

        if let Some(PooledEntry { info, payload }) = state.idle.take() {
            let id = info.id;
            state.active.insert_allocated(info);
            return Ok(Claim::Ready(Grant::Entry { id, payload }));
        }

        if state.total_count() < self.config.max_total {
            state.creating += 1;
            return Ok(Claim::Ready(Grant::Create));
        }

        if !self.config.block_when_exhausted {
            drop(state);
            return Err(self.exhausted(Duration::ZERO));
        }

        let (tx, rx) = channel();
        let ticket = state.waiters.enqueue(tx);
        Ok(Claim::Wait { ticket, rx })
    }

    fn wait_blocking(
        &self,
        ticket: u64,
        rx: channel::Receiver<Grant<F::Object>>,
        deadline: Option<Instant>,
        started: Instant,
    ) -> PoolResult<Grant<F::Object>> {
        let received = match deadline {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(grant) => Ok(grant),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Closed),
            Err(RecvTimeoutError::Timeout) => {
                let cancelled = self.state.lock().waiters.cancel(ticket);
                if cancelled {
                    Err(self.exhausted(started.elapsed()))
                } else {
                    // Served between the timeout and the cancel.
                    rx.try_recv().map_err(|_| PoolError::Closed)
                }
            }
        }
    }

    fn exhausted(&self, waited: Duration) -> PoolError {
        self.metrics.exhausted.fetch_add(1, Ordering::Relaxed);
        PoolError::Exhausted { waited }
    }

    /// Turn a grant into a lent object. `Ok(None)` means the idle object
    /// was unusable and the borrow should try again.
    fn complete(
        self: &Arc<Self>,
        grant: Grant<F::Object>,
        location: &'static Location<'static>,
    ) -> PoolResult<Option<PooledObject<F::Object>>> {
        match grant {
            Grant::Entry { id, payload } => self.prepare(id, payload, location, false),
            Grant::Create => {
                let payload = match self.factory.create() {
                    Ok(payload) => payload,
                    Err(source) => {
                        self.cancel_creation();
                        return Err(PoolError::factory(FactoryOperation::Create, source));
                    }
                };

                let id = {
                    let mut state = self.state.lock();
                    state.creating -= 1;
                    if state.closed {
                        None
                    } else {
                        let id = state.next_id();
                        state.active.insert_allocated(EntryInfo::new(id));
                        Some(id)
                    }
                };
                self.metrics.created.fetch_add(1, Ordering::Relaxed);

                let Some(id) = id else {
                    self.destroy_payload(payload);
                    return Err(PoolError::Closed);
                };
                debug!(entry_id = id, "Created pooled object");
                self.prepare(id, payload, location, true)
            }
        }
    }

    fn prepare(
        self: &Arc<Self>,
        id: u64,
        mut payload: F::Object,
        location: &'static Location<'static>,
        fresh: bool,
    ) -> PoolResult<Option<PooledObject<F::Object>>> {
        if let Err(source) = self.factory.activate(&mut payload) {
            warn!(entry_id = id, error = %source, "Failed to activate pooled object");
            self.discard(id, payload);
            return if fresh {
                Err(PoolError::factory(FactoryOperation::Activate, source))
            } else {
                Ok(None)
            };
        }

        let validate = self.config.test_on_borrow || (fresh && self.config.test_on_create);
        if validate && !self.factory.validate(&payload) {
            self.metrics.validation_failures.fetch_add(1, Ordering::Relaxed);
            self.metrics
                .destroyed_by_borrow_validation
                .fetch_add(1, Ordering::Relaxed);
            debug!(entry_id = id, "Pooled object failed validation on borrow");
            self.discard(id, payload);
            return if fresh {
                Err(PoolError::ValidationFailed)
            } else {
                Ok(None)
            };
        }

        let borrowed = self.state.lock().active.mark_borrowed(id, location);
        if !borrowed {
            // The pool closed while the object was being prepared.
            self.destroy_payload(payload);
            return Err(PoolError::Closed);
        }
        self.metrics.borrowed.fetch_add(1, Ordering::Relaxed);

        let lender: Arc<dyn Lender<F::Object>> = Arc::clone(self) as _;
        Ok(Some(PooledObject::new(payload, id, lender)))
    }

    /// Destroy an allocated entry that could not be lent.
    fn discard(&self, id: u64, payload: F::Object) {
        {
            let mut state = self.state.lock();
            if state.active.remove(id).is_some() {
                self.release_capacity(&mut state);
            }
        }
        self.destroy_payload(payload);
    }

    fn cancel_creation(&self) {
        let mut state = self.state.lock();
        state.creating -= 1;
        self.release_capacity(&mut state);
    }

    /// Pass freed capacity on to waiters as creation slots.
    pub(crate) fn release_capacity(&self, state: &mut PoolState<F::Object>) {
        while !state.waiters.is_empty() && state.total_count() < self.config.max_total {
            state.creating += 1;
            if state.waiters.deliver(Grant::Create).is_err() {
                state.creating -= 1;
                break;
            }
        }
    }

    /// Put back a grant whose waiter gave up after it was delivered.
    fn release_grant(&self, grant: Grant<F::Object>) {
        match grant {
            Grant::Entry { id, payload } => {
                let mut state = self.state.lock();
                let Some(info) = state.active.remove(id) else {
                    drop(state);
                    self.destroy_payload(payload);
                    return;
                };
                if let Some(entry) = state.offer(PooledEntry { info, payload }) {
                    state.idle.push(entry);
                }
            }
            Grant::Create => self.cancel_creation(),
        }
    }

    pub(crate) fn return_entry(&self, id: u64, mut payload: F::Object) -> PoolResult<()> {
        if !self.state.lock().active.is_borrowed(id) {
            self.destroy_payload(payload);
            return self.unknown_object(id);
        }

        let reusable = self.passivate(id, &mut payload);

        let mut state = self.state.lock();
        let Some(mut info) = state.active.remove(id) else {
            // Reclaimed while it was being passivated.
            drop(state);
            self.destroy_payload(payload);
            return self.unknown_object(id);
        };
        self.metrics.returned.fetch_add(1, Ordering::Relaxed);

        if !reusable {
            self.release_capacity(&mut state);
            drop(state);
            debug!(entry_id = id, "Destroying returned object that failed reset or validation");
            self.destroy_payload(payload);
            return Ok(());
        }

        info.mark_returned();
        if let Some(entry) = state.offer(PooledEntry { info, payload }) {
            if state.idle.len() >= self.config.max_idle {
                drop(state);
                self.destroy_payload(entry.payload);
                return Ok(());
            }
            state.idle.push(entry);
        }
        Ok(())
    }

    fn passivate(&self, id: u64, payload: &mut F::Object) -> bool {
        if let Err(err) = self.factory.passivate(payload) {
            warn!(entry_id = id, error = %err, "Failed to passivate returned object");
            return false;
        }
        if self.config.test_on_return && !self.factory.validate(payload) {
            self.metrics.validation_failures.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub(crate) fn invalidate_entry(&self, id: u64, payload: F::Object) -> PoolResult<()> {
        let tracked = {
            let mut state = self.state.lock();
            let tracked = state.active.remove(id).is_some();
            if tracked {
                self.release_capacity(&mut state);
            }
            tracked
        };
        self.destroy_payload(payload);
        if !tracked {
            return self.unknown_object(id);
        }

        debug!(entry_id = id, "Invalidated pooled object");
        self.ensure_min_idle();
        Ok(())
    }

    fn unknown_object(&self, id: u64) -> PoolResult<()> {
        if self.state.lock().closed {
            debug!(entry_id = id, "Object came back after the pool closed");
            return Err(PoolError::Closed);
        }
        self.metrics.unknown_returns.fetch_add(1, Ordering::Relaxed);
        debug!(entry_id = id, "Object is not borrowed from this pool");
        if self.config.fail_on_unknown_return {
            Err(PoolError::UnknownObject)
        } else {
            Ok(())
        }
    }

    /// Destroy through the factory. Failures are logged, never propagated.
    pub(crate) fn destroy_payload(&self, payload: F::Object) {
        if let Err(err) = self.factory.destroy(payload) {
            warn!(error = %err, "Failed to destroy pooled object");
        }
        self.metrics.destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_object(&self) -> PoolResult<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            if state.total_count() >= self.config.max_total {
                return Err(PoolError::PoolFull);
            }
            state.creating += 1;
        }

        let mut payload = match self.factory.create() {
            Ok(payload) => payload,
            Err(source) => {
                self.cancel_creation();
                return Err(PoolError::factory(FactoryOperation::Create, source));
            }
        };
        self.metrics.created.fetch_add(1, Ordering::Relaxed);

        if let Err(source) = self.factory.passivate(&mut payload) {
            self.cancel_creation();
            self.destroy_payload(payload);
            return Err(PoolError::factory(FactoryOperation::Passivate, source));
        }

        let mut state = self.state.lock();
        state.creating -= 1;
        if state.closed {
            drop(state);
            self.destroy_payload(payload);
            return Err(PoolError::Closed);
        }
        let id = state.next_id();
        if let Some(entry) = state.offer(PooledEntry::new(id, payload)) {
            state.idle.push(entry);
        }
        debug!(entry_id = id, "Added idle object");
        Ok(())
    }

    /// Create idle objects until `min_idle` is met or capacity runs out.
    pub(crate) fn ensure_min_idle(&self) {
        let min_idle = self.config.min_idle;
        loop {
            let short = {
                let state = self.state.lock();
                !state.closed && state.idle.len() < min_idle
            };
            if !short {
                return;
            }
            match self.add_object() {
                Ok(()) => {}
                Err(PoolError::PoolFull | PoolError::Closed) => return,
                Err(err) => {
                    warn!(error = %err, "Failed to replenish idle objects");
                    return;
                }
            }
        }
    }

    fn clear(&self) {
        let drained = {
            let mut state = self.state.lock();
            let drained = state.idle.drain();
            self.release_capacity(&mut state);
            drained
        };
        for entry in drained {
            self.destroy_payload(entry.payload);
        }
    }

    fn close(&self) {
        let (idle, outstanding, failed_waiters) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let idle = state.idle.drain();
            let outstanding = state.active.clear();
            let failed_waiters = state.waiters.clear();
            (idle, outstanding, failed_waiters)
        };

        let evictor = self.evictor.lock().take();
        if let Some(evictor) = evictor {
            evictor.stop();
        }
        for entry in idle {
            self.destroy_payload(entry.payload);
        }
        info!(outstanding, failed_waiters, "Closed object pool");
    }

    fn snapshot(&self) -> PoolMetrics {
        let gauges = {
            let state = self.state.lock();
            PoolGauges {
                idle: state.idle.len(),
                active: state.active.len(),
                total: state.total_count(),
                waiters: state.waiters.len(),
                longest_wait: state.waiters.longest_wait(Instant::now()),
                max_total: self.config.max_total,
                closed: state.closed,
            }
        };
        self.metrics.snapshot(gauges)
    }
}

impl<F: ObjectFactory> Lender<F::Object> for PoolInner<F> {
    fn release(&self, id: u64, payload: F::Object) {
        if let Err(err) = self.return_entry(id, payload) {
            debug!(entry_id = id, error = %err, "Dropped object could not be returned");
        }
    }

    fn touch(&self, id: u64) {
        self.state.lock().active.touch(id);
    }

    fn forget(&self, id: u64) {
        let mut state = self.state.lock();
        if state.active.remove(id).is_some() {
            self.release_capacity(&mut state);
        }
    }
}

impl<F: ObjectFactory> Drop for PoolInner<F> {
    fn drop(&mut self) {
        if let Some(evictor) = self.evictor.get_mut().take() {
            evictor.stop();
        }
        let idle = self.state.get_mut().idle.drain();
        for entry in idle {
            self.destroy_payload(entry.payload);
        }
    }
}

/// A borrower parked on an async handoff channel.
///
/// Dropping it withdraws the ticket; a grant that was already delivered
/// goes back to the pool.
struct PendingGrant<'a, F: ObjectFactory> {
    pool: &'a PoolInner<F>,
    ticket: u64,
    rx: Option<oneshot::Receiver<Grant<F::Object>>>,
}

impl<F: ObjectFactory> PendingGrant<'_, F> {
    async fn wait(
        &mut self,
        deadline: Option<Instant>,
        started: Instant,
    ) -> PoolResult<Grant<F::Object>> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(PoolError::Closed);
        };

        let received = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.into(), rx).await.ok(),
            None => Some(rx.await),
        };

        match received {
            Some(Ok(grant)) => {
                self.rx = None;
                Ok(grant)
            }
            Some(Err(_)) => {
                self.rx = None;
                Err(PoolError::Closed)
            }
            None => match self.cancel()? {
                Some(grant) => Ok(grant),
                None => Err(self.pool.exhausted(started.elapsed())),
            },
        }
    }

    /// Withdraw the ticket. `Ok(None)` means it was still queued, and a
    /// ticket dropped by `close` reports `Closed`.
    fn cancel(&mut self) -> PoolResult<Option<Grant<F::Object>>> {
        let Some(mut rx) = self.rx.take() else {
            return Ok(None);
        };
        if self.pool.state.lock().waiters.cancel(self.ticket) {
            return Ok(None);
        }
        rx.try_recv().map(Some).map_err(|_| PoolError::Closed)
    }
}

impl<F: ObjectFactory> Drop for PendingGrant<'_, F> {
    fn drop(&mut self) {
        if let Ok(Some(grant)) = self.cancel() {
            self.pool.release_grant(grant);
        }
    }
}

/// Bounded pool of factory-made objects with idle eviction and
/// abandoned-object reclamation.
///
/// Cloning the pool yields another handle to the same objects.
///
/// # Examples
///
/// ```
/// use generic_objectpool::{FnFactory, GenericObjectPool, PoolConfiguration};
///
/// let pool = GenericObjectPool::new(
///     FnFactory::new(|| Vec::<u8>::with_capacity(1024)),
///     PoolConfiguration::new().with_max_total(4),
/// )
/// .unwrap();
///
/// {
///     let mut buffer = pool.borrow_object().unwrap();
///     buffer.push(1);
///     assert_eq!(pool.active_count(), 1);
/// }
///
/// assert_eq!(pool.idle_count(), 1);
/// assert_eq!(pool.borrowed_count(), 1);
/// assert_eq!(pool.returned_count(), 1);
/// ```
pub struct GenericObjectPool<F: ObjectFactory> {
    pub(crate) inner: Arc<PoolInner<F>>,
}

impl<F: ObjectFactory> Clone for GenericObjectPool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ObjectFactory> fmt::Debug for GenericObjectPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericObjectPool")
            .field("metrics", &self.get_metrics())
            .finish()
    }
}

impl<F: ObjectFactory> GenericObjectPool<F> {
    /// Create a pool. Starts the maintenance thread when an eviction
    /// interval is configured, and pre-fills to `min_idle` with `warmup`.
    pub fn new(factory: F, config: PoolConfiguration) -> PoolResult<Self> {
        config.validate()?;
        let interval = config.eviction_interval();

        debug!(
            max_total = config.max_total,
            max_idle = config.max_idle,
            min_idle = config.min_idle,
            abandoned = config.abandoned.is_some(),
            "Created object pool"
        );

        let pool = Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState::new(config.lifo, config.max_total)),
                factory,
                metrics: MetricsTracker::new(),
                evictor: Mutex::new(None),
                config,
            }),
        };

        if pool.inner.config.warmup {
            pool.prepare_pool()?;
        }

        if let Some(period) = interval {
            let evictor = Evictor::start(Arc::downgrade(&pool.inner), period)
                .map_err(|err| PoolError::Maintenance(err.to_string()))?;
            *pool.inner.evictor.lock() = Some(evictor);
        }

        Ok(pool)
    }

    /// Borrow an object, waiting up to the configured `max_wait`
    #[track_caller]
    pub fn borrow_object(&self) -> PoolResult<PooledObject<F::Object>> {
        self.inner
            .borrow_blocking(self.inner.config.max_wait, Location::caller())
    }

    /// Borrow an object, waiting at most `max_wait`
    #[track_caller]
    pub fn borrow_object_timeout(&self, max_wait: Duration) -> PoolResult<PooledObject<F::Object>> {
        self.inner.borrow_blocking(Some(max_wait), Location::caller())
    }

    /// Borrow an object only if one is available right away
    #[track_caller]
    pub fn try_borrow_object(&self) -> Option<PooledObject<F::Object>> {
        self.inner
            .borrow_blocking(Some(Duration::ZERO), Location::caller())
            .ok()
    }

    /// Borrow an object asynchronously, waiting up to `max_wait`.
    ///
    /// Dropping the future while it waits gives up its place in line.
    #[track_caller]
    pub fn borrow_object_async(
        &self,
    ) -> impl Future<Output = PoolResult<PooledObject<F::Object>>> + '_ {
        let location = Location::caller();
        async move {
            self.inner
                .borrow_async(self.inner.config.max_wait, location)
                .await
        }
    }

    /// Give an object back, reporting objects the pool no longer tracks
    pub fn return_object(&self, object: PooledObject<F::Object>) -> PoolResult<()> {
        let (id, payload, lender) = object.into_parts();
        if !self.lends(&lender) {
            lender.release(id, payload);
            return Err(PoolError::UnknownObject);
        }
        self.inner.return_entry(id, payload)
    }

    /// Destroy a broken object instead of returning it
    pub fn invalidate_object(&self, object: PooledObject<F::Object>) -> PoolResult<()> {
        let (id, payload, lender) = object.into_parts();
        if !self.lends(&lender) {
            lender.release(id, payload);
            return Err(PoolError::UnknownObject);
        }
        self.inner.invalidate_entry(id, payload)
    }

    fn lends(&self, lender: &Arc<dyn Lender<F::Object>>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(lender), Arc::as_ptr(&self.inner))
    }

    /// Create one idle object
    pub fn add_object(&self) -> PoolResult<()> {
        self.inner.add_object()
    }

    /// Fill the idle registry up to `min_idle`
    pub fn prepare_pool(&self) -> PoolResult<()> {
        loop {
            if self.idle_count() >= self.inner.config.min_idle {
                return Ok(());
            }
            match self.inner.add_object() {
                Ok(()) => {}
                Err(PoolError::PoolFull) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    /// Run one eviction sweep now, returning the number of objects evicted
    pub fn evict(&self) -> usize {
        self.inner.evict()
    }

    /// Reclaim abandoned objects now, returning how many were reclaimed
    pub fn remove_abandoned(&self) -> usize {
        match &self.inner.config.abandoned {
            Some(config) => self.inner.remove_abandoned(config),
            None => 0,
        }
    }

    /// Destroy every idle object
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Close the pool: destroy idle objects, fail waiters, stop maintenance.
    ///
    /// Objects still borrowed are destroyed when they come back.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Whether the pool has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfiguration {
        &self.inner.config
    }

    /// Get successful borrow count
    pub fn borrowed_count(&self) -> usize {
        self.inner.metrics.borrowed.load(Ordering::Relaxed)
    }

    /// Get returned object count
    pub fn returned_count(&self) -> usize {
        self.inner.metrics.returned.load(Ordering::Relaxed)
    }

    /// Get created object count
    pub fn created_count(&self) -> usize {
        self.inner.metrics.created.load(Ordering::Relaxed)
    }

    /// Get destroyed object count
    pub fn destroyed_count(&self) -> usize {
        self.inner.metrics.destroyed.load(Ordering::Relaxed)
    }

    /// Objects the pool accounts for: idle, borrowed and being created
    pub fn total_count(&self) -> usize {
        self.inner.state.lock().total_count()
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Get active count
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active.len()
    }

    /// Borrowers currently blocked waiting for an object
    pub fn waiter_count(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Lifecycle data of every idle and borrowed object
    pub fn list_all_objects(&self) -> Vec<EntryInfo> {
        let state = self.inner.state.lock();
        state
            .idle
            .infos()
            .chain(state.active.infos())
            .cloned()
            .collect()
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.snapshot()
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus::from_metrics(&self.get_metrics())
    }

    /// Prometheus collector for this pool, labelled `pool="<pool_name>"`.
    ///
    /// The collector holds a weak handle and reports an empty, closed pool
    /// once every pool handle is gone.
    #[cfg(feature = "metrics")]
    pub fn collector(&self, pool_name: &str) -> prometheus::Result<PoolCollector> {
        let pool = Arc::downgrade(&self.inner);
        let max_total = self.inner.config.max_total;
        PoolCollector::new(
            pool_name,
            Box::new(move || match pool.upgrade() {
                Some(inner) => inner.snapshot(),
                None => MetricsTracker::new().snapshot(PoolGauges {
                    idle: 0,
                    active: 0,
                    total: 0,
                    waiters: 0,
                    longest_wait: Duration::ZERO,
                    max_total,
                    closed: true,
                }),
            }),
        )
    }
}
