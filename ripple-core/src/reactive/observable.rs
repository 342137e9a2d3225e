//! Observable Implementation
//!
//! An Observable is the subscription registry attached to one mutable value
//! slot. It knows nothing about the value itself; the instrumentation layer
//! calls [`Observable::depend`] on every read and [`Observable::notify`] after
//! every write.
//!
//! # How Observables Work
//!
//! 1. When read while a subscriber is evaluating, the observable asks that
//!    subscriber to record the dependency. The subscriber decides whether it
//!    is new and, if so, calls back into `add_subscriber`.
//!
//! 2. When the value changes, `notify` snapshots the subscriber list and
//!    re-evaluates each entry in subscription order.
//!
//! The snapshot is what keeps notification stable: a subscriber re-running
//! inside the pass may unsubscribe and resubscribe (even to this observable)
//! without causing skipped, duplicated or endlessly repeated notifications.
//!
//! # Memory
//!
//! The registry holds weak references. A subscriber that has been dropped is
//! skipped, and its entry is pruned once a pass has run into it.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::{self, NotifyScope};
use super::subscriber::{subscriber_addr, Subscriber, SubscriberId};
use crate::config::TrackingConfig;
use crate::error::Result;
use crate::util::remove_first;

/// Unique identifier for an observable.
///
/// Assigned from a monotonically increasing counter at construction. Used as
/// a deduplication key by subscribers, never for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservableId(u64);

impl ObservableId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObservableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obs#{}", self.0)
    }
}

/// Snapshot buffer used by `notify`. Most observables have a handful of
/// subscribers, so the common case never allocates.
type Snapshot = SmallVec<[Weak<dyn Subscriber>; 8]>;

struct ObservableInner {
    id: ObservableId,
    /// Bumped on every `notify`, before any subscriber runs.
    version: AtomicU64,
    /// Subscribers in subscription order.
    subscribers: RwLock<Vec<Weak<dyn Subscriber>>>,
}

/// A subscription registry for one observable value.
///
/// Cloning an `Observable` yields another handle to the same registry.
///
/// # Example
///
/// ```rust,ignore
/// let observable = Observable::new();
///
/// // Instrumented read
/// observable.depend();
///
/// // Instrumented write
/// observable.notify();
/// ```
#[derive(Clone)]
pub struct Observable {
    inner: Arc<ObservableInner>,
}

impl Observable {
    /// Create a new observable with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                id: ObservableId::next(),
                version: AtomicU64::new(0),
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Get the observable's unique ID.
    pub fn id(&self) -> ObservableId {
        self.inner.id
    }

    /// Number of `notify` calls so far.
    ///
    /// Lazy subscribers compare versions to tell whether an input changed
    /// regardless of the order in which they were notified.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Append a subscriber.
    ///
    /// No duplicate check is made here; subscribers deduplicate themselves
    /// before calling this.
    pub fn add_subscriber(&self, subscriber: &Arc<dyn Subscriber>) {
        self.inner
            .subscribers
            .write()
            .push(Arc::downgrade(subscriber));
    }

    /// Remove the first occurrence of `subscriber`. No-op if absent.
    pub fn remove_subscriber(&self, subscriber: &dyn Subscriber) {
        if self.remove_at(subscriber_addr(subscriber)) {
            tracing::trace!(observable = %self.inner.id, subscriber = %subscriber.id(), "unsubscribed");
        }
    }

    /// Remove the first entry pointing at `target`.
    ///
    /// Used from `Drop`, where the subscriber can no longer be upgraded or
    /// viewed as a trait object. The weak entry keeps the allocation alive,
    /// so the address still identifies it.
    pub(crate) fn remove_at(&self, target: *const ()) -> bool {
        let mut subscribers = self.inner.subscribers.write();
        remove_first(&mut *subscribers, |weak| Weak::as_ptr(weak) as *const () == target).is_some()
    }

    /// Record a dependency of the currently evaluating subscriber on this
    /// observable. No-op when nothing is being tracked.
    pub fn depend(&self) {
        if let Some(target) = context::current_target() {
            target.collect_dependency(self);
        }
    }

    /// Re-evaluate every subscriber, in subscription order.
    ///
    /// If the pass would nest deeper than [`TrackingConfig::max_notify_depth`]
    /// it is aborted and the error is logged; see [`Observable::try_notify`].
    pub fn notify(&self) {
        if let Err(err) = self.try_notify() {
            tracing::error!(%err, observable = %self.inner.id, "notification aborted");
        }
    }

    /// Checked variant of [`Observable::notify`].
    pub fn try_notify(&self) -> Result<()> {
        self.inner.version.fetch_add(1, Ordering::SeqCst);

        let snapshot: Snapshot = self.inner.subscribers.read().iter().cloned().collect();
        if snapshot.is_empty() {
            return Ok(());
        }

        let limit = TrackingConfig::current().max_notify_depth;
        let _scope = NotifyScope::enter(self.inner.id, limit)?;

        tracing::debug!(
            observable = %self.inner.id,
            subscribers = snapshot.len(),
            "notifying subscribers"
        );

        let mut saw_dropped = false;
        for weak in &snapshot {
            match weak.upgrade() {
                Some(subscriber) => subscriber.reevaluate(),
                None => saw_dropped = true,
            }
        }

        if saw_dropped {
            self.prune_dropped();
        }

        Ok(())
    }

    /// Number of registered entries, including duplicates.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// IDs of the live subscribers, in subscription order.
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        // Upgraded handles are dropped after the lock is released, since a
        // last handle unregisters itself.
        let live: Vec<Arc<dyn Subscriber>> = self
            .inner
            .subscribers
            .read()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        live.iter().map(|s| s.id()).collect()
    }

    /// Whether `subscriber` is registered (by reference identity).
    pub fn has_subscriber(&self, subscriber: &dyn Subscriber) -> bool {
        let target = subscriber_addr(subscriber);
        self.inner
            .subscribers
            .read()
            .iter()
            .any(|weak| Weak::as_ptr(weak) as *const () == target)
    }

    /// Whether two handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Observable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn prune_dropped(&self) {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|weak| weak.strong_count() > 0);

        tracing::debug!(
            observable = %self.inner.id,
            pruned = before - subscribers.len(),
            "pruned dropped subscribers"
        );
    }
}

impl Default for Observable {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("id", &self.inner.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
