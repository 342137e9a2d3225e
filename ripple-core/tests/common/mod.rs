//! Shared test fixtures.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use ripple_core::reactive::{Observable, ObservableId, Subscriber, SubscriberId};

/// Hand-written subscriber honouring the collect/dedup contract directly,
/// without the `Effect` machinery.
pub struct Probe {
    id: SubscriberId,
    deps: Mutex<HashSet<ObservableId>>,
    runs: AtomicUsize,
    on_run: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: SubscriberId::new(),
            deps: Mutex::new(HashSet::new()),
            runs: AtomicUsize::new(0),
            on_run: Mutex::new(None),
        })
    }

    /// Run `hook` inside every `reevaluate`.
    pub fn on_run(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_run.lock() = Some(Arc::new(hook));
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn dependency_count(&self) -> usize {
        self.deps.lock().len()
    }
}

impl Subscriber for Probe {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn collect_dependency(self: Arc<Self>, observable: &Observable) {
        if self.deps.lock().insert(observable.id()) {
            let me: Arc<dyn Subscriber> = self;
            observable.add_subscriber(&me);
        }
    }

    fn reevaluate(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        // Cloned out so a hook may re-enter this probe.
        let hook = self.on_run.lock().clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

pub fn as_dyn(probe: &Arc<Probe>) -> Arc<dyn Subscriber> {
    probe.clone()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
