//! Memo Implementation
//!
//! A Memo is a lazy subscriber: a cached derived value that recomputes only
//! when read after one of its dependencies changed.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation inside its own tracking
//!    scope and caches the result.
//!
//! 2. When a dependency notifies, the memo is only marked dirty. Nothing is
//!    recomputed until the next read.
//!
//! 3. When a memo is read while another subscriber is evaluating, the memo
//!    calls `depend()` on each of its own dependencies. The reader thereby
//!    subscribes to the underlying observables directly and is notified
//!    whenever the memo's inputs change.
//!
//! # Freshness
//!
//! A reader may be notified before the memo is (it subscribed to a shared
//! input first). The memo therefore also stamps the version of every input
//! after computing, and a read of a clean memo whose inputs have moved on
//! recomputes anyway. Reads never return a value older than the inputs.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::context::{self, ReactiveContext};
use super::deps::DependencySet;
use super::observable::Observable;
use super::subscriber::{Subscriber, SubscriberId};

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency changed (or the memo never ran). Recompute on next read.
    Dirty,
}

/// A cached derived value that recomputes only when dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. Must be Clone + Send + Sync.
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: SubscriberId,

    /// The computation function.
    compute: Box<dyn Fn() -> T + Send + Sync>,

    /// The cached value (None if never computed).
    value: RwLock<Option<T>>,

    state: RwLock<MemoState>,

    /// Observables read by the last computation.
    deps: Mutex<DependencySet>,

    compute_count: AtomicUsize,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new(MemoInner {
            id: SubscriberId::new(),
            compute: Box::new(compute),
            value: RwLock::new(None),
            state: RwLock::new(MemoState::Dirty),
            deps: Mutex::new(DependencySet::new()),
            compute_count: AtomicUsize::new(0),
        });
        Self { inner }
    }

    /// Get the subscriber ID for this memo.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// If another subscriber is evaluating, it becomes a dependent of every
    /// observable this memo read.
    pub fn get(&self) -> T {
        let value = self.inner.value_or_recompute();

        if context::is_tracking() {
            let deps = self.inner.deps.lock().observables();
            for observable in &deps {
                observable.depend();
            }
        }

        value
    }

    /// Mark the memo as needing recomputation.
    pub fn mark_dirty(&self) {
        *self.inner.state.write() = MemoState::Dirty;
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        *self.inner.state.read()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    /// Get the number of times the computation has run.
    pub fn compute_count(&self) -> usize {
        self.inner.compute_count.load(Ordering::SeqCst)
    }

    /// Get the number of observables read by the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }

    /// This memo as a subscriber.
    pub fn as_subscriber(&self) -> Arc<dyn Subscriber> {
        self.inner.clone()
    }
}

impl<T> MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn value_or_recompute(self: &Arc<Self>) -> T {
        let fresh = *self.state.read() == MemoState::Clean
            && !self.deps.lock().changed_since_stamp();
        if fresh {
            if let Some(value) = self.value.read().clone() {
                return value;
            }
        }
        self.recompute()
    }

    /// Run the computation within a tracking scope and cache the result.
    fn recompute(self: &Arc<Self>) -> T {
        self.deps.lock().begin_pass();
        let value = {
            let _ctx = ReactiveContext::enter(self.clone());
            (self.compute)()
        };
        let stale = {
            let mut deps = self.deps.lock();
            let stale = deps.finish_pass();
            deps.stamp();
            stale
        };
        for observable in &stale {
            observable.remove_subscriber(&**self);
        }

        *self.value.write() = Some(value.clone());
        *self.state.write() = MemoState::Clean;
        let runs = self.compute_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::trace!(memo = %self.id, runs, stale = stale.len(), "memo recomputed");
        value
    }
}

impl<T> Subscriber for MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn collect_dependency(self: Arc<Self>, observable: &Observable) {
        let subscribe = self.deps.lock().record(observable);
        if subscribe {
            let me: Arc<dyn Subscriber> = self;
            observable.add_subscriber(&me);
        }
    }

    fn reevaluate(&self) {
        // Lazy: the next read recomputes.
        *self.state.write() = MemoState::Dirty;
        tracing::trace!(memo = %self.id, "memo marked dirty");
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        let addr = self as *const MemoInner<T> as *const ();
        for observable in self.deps.get_mut().clear() {
            observable.remove_at(addr);
        }
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn memo_computes_on_first_access() {
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let memo = Memo::new(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        // Not computed yet
        assert!(!memo.has_value());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        // First access triggers computation
        assert_eq!(memo.get(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(memo.has_value());
    }

    #[test]
    fn memo_caches_value_when_clean() {
        let memo = Memo::new(|| 42);

        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.compute_count(), 1);
    }

    #[test]
    fn notify_marks_dirty_without_recomputing() {
        let observable = Observable::new();
        let obs = observable.clone();
        let memo = Memo::new(move || {
            obs.depend();
            7
        });

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);
        assert_eq!(observable.subscriber_count(), 1);

        observable.notify();
        assert_eq!(memo.state(), MemoState::Dirty);
        assert_eq!(memo.compute_count(), 1);

        memo.get();
        assert_eq!(memo.compute_count(), 2);
        assert_eq!(memo.state(), MemoState::Clean);
        assert_eq!(observable.subscriber_count(), 1);
    }

    #[test]
    fn reader_inherits_memo_dependencies() {
        let observable = Observable::new();
        let obs = observable.clone();
        let memo = Memo::new(move || {
            obs.depend();
            1
        });

        let reader = Memo::new({
            let memo = memo.clone();
            move || memo.get() + 1
        });

        assert_eq!(reader.get(), 2);
        assert_eq!(reader.dependency_count(), 1);
        assert_eq!(
            observable.subscriber_ids(),
            vec![memo.id(), reader.id()]
        );
    }

    #[test]
    fn clean_memo_recomputes_when_input_moved_on() {
        let observable = Observable::new();
        let obs = observable.clone();
        let memo = Memo::new(move || {
            obs.depend();
            obs.version()
        });

        assert_eq!(memo.get(), 0);

        // Bump the version without the memo hearing about it.
        observable.remove_subscriber(&*memo.as_subscriber());
        observable.notify();
        assert_eq!(memo.state(), MemoState::Clean);

        assert_eq!(memo.get(), 1);
        assert_eq!(memo.compute_count(), 2);
    }

    #[test]
    fn dropped_memos_unsubscribe_without_notify() {
        let observable = Observable::new();

        for i in 0..100 {
            let obs = observable.clone();
            let memo = Memo::new(move || {
                obs.depend();
                i
            });
            assert_eq!(memo.get(), i);
        }

        assert_eq!(observable.subscriber_count(), 0);
    }

    #[test]
    fn memo_state_transitions() {
        let memo = Memo::new(|| 42);

        // Starts dirty
        assert_eq!(memo.state(), MemoState::Dirty);

        // After get, becomes clean
        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);

        memo.mark_dirty();
        assert_eq!(memo.state(), MemoState::Dirty);

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);
        assert_eq!(memo.compute_count(), 2);
    }

    #[test]
    fn memo_clone_shares_state() {
        let memo1 = Memo::new(|| 42);
        assert_eq!(memo1.get(), 42);

        let memo2 = memo1.clone();
        assert_eq!(memo1.id(), memo2.id());
        assert!(memo2.has_value());

        memo1.mark_dirty();
        assert_eq!(memo2.state(), MemoState::Dirty);
    }
}
