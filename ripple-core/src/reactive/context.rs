//! Tracking Context
//!
//! The tracking context records which subscriber is currently evaluating.
//! This enables automatic dependency tracking: when an observable is read,
//! it asks the current subscriber to record the dependency.
//!
//! # Implementation
//!
//! We keep a thread-local `current` pointer plus an explicit stack of saved
//! entries. `push_target` saves the active entry (if an evaluation is in
//! progress) and installs the new one; `pop_target` restores the saved entry.
//! Pushing `None` suspends tracking for a nested scope.
//!
//! The raw `push_target` / `pop_target` pair must be balanced on every exit
//! path. Prefer the scoped [`ReactiveContext`] guard, which pops in `Drop`
//! and therefore also on early return and panic.
//!
//! The same thread-local also counts how deeply `notify` passes are nested,
//! which bounds runaway re-entrant notification.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::observable::ObservableId;
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::{Result, TrackError};

thread_local! {
    static TRACKING: RefCell<TrackingState> = RefCell::new(TrackingState::new());
}

/// Per-thread tracking state.
///
/// Invariant: `stack.len() == depth.saturating_sub(1)`, and `current` is
/// `None` whenever `depth == 0`.
struct TrackingState {
    /// The innermost active entry. `None` while idle or suspended.
    current: Option<Arc<dyn Subscriber>>,
    /// Entries saved by nested pushes, innermost last.
    stack: Vec<Option<Arc<dyn Subscriber>>>,
    /// Number of unmatched `push_target` calls.
    depth: usize,
    /// Number of `notify` passes currently running on this thread.
    notify_depth: usize,
}

impl TrackingState {
    const fn new() -> Self {
        Self {
            current: None,
            stack: Vec::new(),
            depth: 0,
            notify_depth: 0,
        }
    }
}

/// Make `target` the active subscriber, saving whatever was active.
///
/// `None` suspends tracking: reads inside the scope record nothing.
pub fn push_target(target: Option<Arc<dyn Subscriber>>) {
    TRACKING.with(|state| {
        let mut state = state.borrow_mut();
        if state.depth > 0 {
            let saved = state.current.take();
            state.stack.push(saved);
        }
        state.current = target;
        state.depth += 1;

        tracing::trace!(
            depth = state.depth,
            target = ?state.current.as_ref().map(|s| s.id()),
            "push_target"
        );
    });
}

/// Restore the entry that was active before the most recent `push_target`.
///
/// An unmatched pop is a caller bug; it is logged and otherwise ignored,
/// leaving the context idle. Use [`try_pop_target`] to observe it.
pub fn pop_target() {
    if let Err(err) = try_pop_target() {
        tracing::warn!(%err, "ignoring unbalanced pop_target");
    }
}

/// Checked variant of [`pop_target`].
pub fn try_pop_target() -> Result<()> {
    let finished = TRACKING.with(|state| {
        let mut state = state.borrow_mut();
        if state.depth == 0 {
            return Err(TrackError::UnbalancedPop);
        }
        state.depth -= 1;
        let restored = state.stack.pop().flatten();
        let finished = std::mem::replace(&mut state.current, restored);

        tracing::trace!(
            depth = state.depth,
            restored = ?state.current.as_ref().map(|s| s.id()),
            "pop_target"
        );
        Ok(finished)
    })?;

    // Released outside the borrow: dropping the last handle to a subscriber
    // may run arbitrary code.
    drop(finished);
    Ok(())
}

/// The subscriber currently evaluating, if any.
pub fn current_target() -> Option<Arc<dyn Subscriber>> {
    TRACKING.with(|state| state.borrow().current.clone())
}

/// ID of the subscriber currently evaluating, if any.
pub fn current_subscriber() -> Option<SubscriberId> {
    TRACKING.with(|state| state.borrow().current.as_ref().map(|s| s.id()))
}

/// Whether reads right now would be attributed to a subscriber.
pub fn is_tracking() -> bool {
    TRACKING.with(|state| state.borrow().current.is_some())
}

/// Current nesting depth of evaluations (including suspended scopes).
pub fn depth() -> usize {
    TRACKING.with(|state| state.borrow().depth)
}

/// Run `f` with tracking suspended.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::suspend();
    f()
}

/// Guard that pops the tracking context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation returns early or panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
    depth: usize,
    // The guard refers to thread-local state and must stay on its thread.
    _not_send: PhantomData<*const ()>,
}

impl ReactiveContext {
    /// Enter a new tracking scope for the given subscriber.
    ///
    /// While this scope is active, any observable that is read will ask the
    /// subscriber to record it as a dependency.
    pub fn enter(subscriber: Arc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.id());
        push_target(Some(subscriber));
        Self {
            subscriber_id,
            depth: depth(),
            _not_send: PhantomData,
        }
    }

    /// Enter a scope in which reads are not tracked.
    pub fn suspend() -> Self {
        push_target(None);
        Self {
            subscriber_id: None,
            depth: depth(),
            _not_send: PhantomData,
        }
    }

    /// The subscriber this scope was entered for (`None` when suspended).
    pub fn subscriber_id(&self) -> Option<SubscriberId> {
        self.subscriber_id
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // A mismatch means a raw push/pop inside this scope was unbalanced.
        debug_assert_eq!(
            depth(),
            self.depth,
            "ReactiveContext for {:?} dropped at the wrong nesting depth",
            self.subscriber_id
        );
        pop_target();
    }
}

/// Guard counting one in-flight `notify` pass on this thread.
pub(crate) struct NotifyScope {
    _not_send: PhantomData<*const ()>,
}

impl NotifyScope {
    /// Enter a notification pass, failing if `limit` passes are already
    /// running on this thread.
    pub(crate) fn enter(observable: ObservableId, limit: usize) -> Result<Self> {
        TRACKING.with(|state| {
            let mut state = state.borrow_mut();
            if state.notify_depth >= limit {
                return Err(TrackError::NotifyDepthExceeded {
                    observable,
                    depth: state.notify_depth + 1,
                    limit,
                });
            }
            state.notify_depth += 1;
            Ok(Self {
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for NotifyScope {
    fn drop(&mut self) {
        TRACKING.with(|state| {
            let mut state = state.borrow_mut();
            state.notify_depth = state.notify_depth.saturating_sub(1);
        });
    }
}
