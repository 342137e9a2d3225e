//! Signal Implementation
//!
//! A Signal is the smallest instrumentation layer over an [`Observable`]: a
//! value cell whose reads call `depend()` and whose writes call `notify()`.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracking scope (memo/effect), the
//!    signal's observable asks the current subscriber to record it.
//!
//! 2. When a signal's value is set, the value lock is released and then every
//!    subscriber is notified, so re-running subscribers can read the new value.
//!
//! Signals do not compare old and new values: every `set` notifies.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::observable::{Observable, ObservableId};

/// A reactive signal holding a value of type T.
///
/// # Type Parameters
///
/// - `T`: The type of value stored in the signal. Must be Clone + Send + Sync.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The current value.
    value: Arc<RwLock<T>>,

    /// Registry of subscribers that read this signal.
    observable: Observable,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            observable: Observable::new(),
        }
    }

    /// Get the ID of the signal's observable.
    pub fn id(&self) -> ObservableId {
        self.observable.id()
    }

    /// The observable guarding this signal.
    pub fn observable(&self) -> &Observable {
        &self.observable
    }

    /// Get the current value, tracking it as a dependency.
    pub fn get(&self) -> T {
        self.observable.depend();
        self.value.read().clone()
    }

    /// Call `f` with the current value, tracking it as a dependency.
    ///
    /// `f` sees a copy taken before it runs, so it may write this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.observable.depend();
        let value = self.value.read().clone();
        f(&value)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.observable.notify();
    }

    /// Update the value in place and notify subscribers.
    ///
    /// The value is locked while `f` runs: `f` must not read or write this
    /// signal.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.value.write());
        self.observable.notify();
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.observable.subscriber_count()
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            observable: self.observable.clone(),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
