//! Subscriber contract for the reactive system.
//!
//! A Subscriber is any computation that depends on observables: effects,
//! memos, render functions. The core only ever asks a subscriber to do two
//! things: record a dependency it just read, and re-run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::observable::Observable;

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. IDs are only used for
/// diagnostics and lookups; registry membership is by reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// A computation that can depend on observables and be asked to re-run.
///
/// Implementors must deduplicate in `collect_dependency`: an observable read
/// several times during one evaluation must be subscribed to only once, or
/// `Observable::notify` will re-run the subscriber once per duplicate.
pub trait Subscriber: Send + Sync {
    /// Get the subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// Called by `Observable::depend` while this subscriber is the active
    /// tracking target.
    ///
    /// Decide whether this is a new dependency and, if so, register with
    /// `observable.add_subscriber(&self)`.
    fn collect_dependency(self: Arc<Self>, observable: &Observable);

    /// Called by `Observable::notify` when a dependency changed.
    fn reevaluate(&self);
}

/// Identity of a subscriber as a thin pointer.
///
/// Comparing thin pointers sidesteps vtable duplication across codegen units,
/// which makes fat-pointer comparison of trait objects unreliable.
pub(crate) fn subscriber_addr(subscriber: &dyn Subscriber) -> *const () {
    subscriber as *const _ as *const ()
}
