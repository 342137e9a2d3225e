//! Ripple Core
//!
//! This crate provides the dependency-tracking and change-notification core
//! for the Ripple reactive framework. It implements:
//!
//! - Observables: per-value subscriber registries
//! - A tracking context recording which subscriber is evaluating
//! - The subscriber contract, plus eager (effect) and lazy (memo) subscribers
//! - Signals, a minimal instrumented value cell
//!
//! Scheduling, batching and proxy-style instrumentation of data structures
//! are left to layers built on top.
//!
//! # Architecture
//!
//! - `reactive`: observables, tracking context and reactive primitives
//! - `config`: process-wide tuning
//! - `error`: errors reported by the checked operations
//!
//! # Example
//!
//! ```rust
//! use ripple_core::reactive::{Effect, Memo, Signal};
//!
//! // Create a signal
//! let count = Signal::new(1);
//!
//! // Create a derived value
//! let doubled = Memo::new({
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! // Create an effect
//! let effect = Effect::new({
//!     let (count, doubled) = (count.clone(), doubled.clone());
//!     move || {
//!         println!("Count: {}, Doubled: {}", count.get(), doubled.get());
//!     }
//! });
//!
//! // Update the signal
//! count.set(5);
//! // Effect runs again, prints: "Count: 5, Doubled: 10"
//! assert_eq!(effect.run_count(), 2);
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod config;
pub mod error;
pub mod reactive;
mod util;

pub use config::TrackingConfig;
pub use error::{Result, TrackError};
