//! Dependency Tracking
//!
//! This module implements the core publish/subscribe mechanism: observables,
//! the tracking context, and the subscriber contract, plus the reference
//! subscribers (effects, memos) and instrumentation (signals) built on them.
//!
//! # Concepts
//!
//! ## Observables
//!
//! An Observable is the subscription registry of one mutable value. Reading
//! the value calls `depend()`, which lets the currently evaluating subscriber
//! record the dependency. Writing the value calls `notify()`, which re-runs
//! every subscriber in subscription order.
//!
//! ## Tracking Context
//!
//! A thread-local pointer to the subscriber currently evaluating, with a
//! stack for nested evaluation. Subscribers push themselves before evaluating
//! and pop afterwards, normally through the [`ReactiveContext`] guard.
//!
//! ## Subscribers
//!
//! Anything implementing [`Subscriber`]. [`Effect`] re-runs eagerly on every
//! notification; [`Memo`] only marks itself dirty and recomputes on the next
//! read.
//!
//! # Implementation Notes
//!
//! Dependency discovery is automatic ("transparent reactivity"): nothing is
//! declared up front, dependencies are whatever a run actually read.
//! Deduplication is the subscriber's job, keyed by [`ObservableId`].

mod context;
mod deps;
mod effect;
mod memo;
mod observable;
mod signal;
mod subscriber;

pub use context::{
    current_subscriber, current_target, depth, is_tracking, pop_target, push_target,
    try_pop_target, untracked, ReactiveContext,
};
pub use effect::Effect;
pub use memo::{Memo, MemoState};
pub use observable::{Observable, ObservableId};
pub use signal::Signal;
pub use subscriber::{Subscriber, SubscriberId};
