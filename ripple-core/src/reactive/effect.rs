//! Effect Implementation
//!
//! An Effect is an eager subscriber: a side-effecting computation that runs
//! again, synchronously, whenever one of its dependencies notifies.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately inside a
//!    tracking scope to establish initial dependencies.
//!
//! 2. Every observable read during a run asks the effect to record it. The
//!    effect subscribes only on the first read of an observable that an
//!    earlier run had not already subscribed to.
//!
//! 3. After each run, the effect unsubscribes from observables it did not
//!    read this time, so conditional reads do not leave stale subscriptions.
//!
//! # Ownership
//!
//! Observables hold effects weakly. Dropping every handle to an effect stops
//! it; [`Effect::dispose`] stops it explicitly and unsubscribes immediately.
//!
//! # Re-entrancy
//!
//! A notification that reaches an effect while it is already running (the
//! effect wrote to something it reads) is skipped. Ordering and batching of
//! effects belong to a scheduler layered on top.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::deps::DependencySet;
use super::observable::Observable;
use super::subscriber::{Subscriber, SubscriberId};

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let c = count.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {}", c.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    id: SubscriberId,

    /// Back-reference used to enter a tracking scope from `reevaluate`.
    this: Weak<EffectInner>,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Observables this effect depends on.
    deps: Mutex<DependencySet>,

    disposed: AtomicBool,
    running: AtomicBool,
    run_count: AtomicUsize,
}

/// Clears the running flag on every exit path, including a panicking run.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it immediately.
    ///
    /// It has no dependencies until the first [`Effect::execute`].
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|this| EffectInner {
            id: SubscriberId::new(),
            this: this.clone(),
            run: Box::new(run),
            deps: Mutex::new(DependencySet::new()),
            disposed: AtomicBool::new(false),
            running: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });
        Self { inner }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Run the effect function, re-collecting its dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Stop the effect and unsubscribe from all of its dependencies.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);

        let deps = self.inner.deps.lock().clear();
        for observable in &deps {
            observable.remove_subscriber(&*self.inner);
        }

        tracing::debug!(effect = %self.inner.id, released = deps.len(), "effect disposed");
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependencies collected by the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }

    /// This effect as a subscriber, e.g. for a manual `push_target`.
    pub fn as_subscriber(&self) -> Arc<dyn Subscriber> {
        self.inner.clone()
    }
}

impl EffectInner {
    fn execute(self: &Arc<Self>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!(effect = %self.id, "skipping re-entrant effect run");
            return;
        }
        let _running = RunningGuard(&self.running);

        self.deps.lock().begin_pass();
        {
            let _ctx = ReactiveContext::enter(self.clone());
            (self.run)();
        }
        let stale = self.deps.lock().finish_pass();

        if !stale.is_empty() {
            tracing::debug!(effect = %self.id, stale = stale.len(), "dropping stale dependencies");
        }
        for observable in &stale {
            observable.remove_subscriber(&**self);
        }

        self.run_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl Subscriber for EffectInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn collect_dependency(self: Arc<Self>, observable: &Observable) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let subscribe = self.deps.lock().record(observable);
        if subscribe {
            let me: Arc<dyn Subscriber> = self;
            observable.add_subscriber(&me);
        }
    }

    fn reevaluate(&self) {
        if let Some(this) = self.this.upgrade() {
            this.execute();
        }
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        let addr = self as *const EffectInner as *const ();
        for observable in self.deps.get_mut().clear() {
            observable.remove_at(addr);
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
