//! Per-subscriber dependency bookkeeping.
//!
//! A subscriber re-collects its dependencies on every evaluation pass. The
//! set keeps two id-keyed maps: `current` holds what the last completed pass
//! read, `pending` what the pass in progress has read so far. Comparing them
//! at the end of a pass yields the observables to unsubscribe from.

use indexmap::IndexMap;

use super::observable::{Observable, ObservableId};

#[derive(Debug, Default)]
pub(crate) struct DependencySet {
    current: IndexMap<ObservableId, Observable>,
    pending: IndexMap<ObservableId, Observable>,
    /// Versions of `current`, in order, as of the last `stamp`.
    stamps: Vec<u64>,
    in_pass: bool,
}

impl DependencySet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start collecting a fresh pass.
    pub(crate) fn begin_pass(&mut self) {
        self.pending.clear();
        self.in_pass = true;
    }

    /// Record a read of `observable`.
    ///
    /// Returns `true` when the caller must subscribe: this is the first read
    /// in the current pass and no earlier pass already subscribed.
    pub(crate) fn record(&mut self, observable: &Observable) -> bool {
        let id = observable.id();

        if !self.in_pass {
            // Tracked read outside an evaluation pass (a manual push_target).
            if self.current.contains_key(&id) {
                return false;
            }
            self.current.insert(id, observable.clone());
            return true;
        }

        if self.pending.contains_key(&id) {
            return false;
        }
        self.pending.insert(id, observable.clone());
        !self.current.contains_key(&id)
    }

    /// Finish the pass, returning the observables that were not read again.
    pub(crate) fn finish_pass(&mut self) -> Vec<Observable> {
        let stale = self
            .current
            .iter()
            .filter(|(id, _)| !self.pending.contains_key(*id))
            .map(|(_, observable)| observable.clone())
            .collect();

        std::mem::swap(&mut self.current, &mut self.pending);
        self.pending.clear();
        self.in_pass = false;
        stale
    }

    /// Remember the version of every current dependency.
    pub(crate) fn stamp(&mut self) {
        self.stamps = self.current.values().map(Observable::version).collect();
    }

    /// Whether any current dependency was notified since the last `stamp`.
    pub(crate) fn changed_since_stamp(&self) -> bool {
        self.stamps.len() != self.current.len()
            || self
                .current
                .values()
                .zip(&self.stamps)
                .any(|(observable, stamp)| observable.version() != *stamp)
    }

    /// Forget every dependency, returning them for unsubscription.
    pub(crate) fn clear(&mut self) -> Vec<Observable> {
        self.pending.clear();
        self.stamps.clear();
        self.in_pass = false;
        self.current.drain(..).map(|(_, observable)| observable).collect()
    }

    /// Dependencies of the last completed pass, in first-read order.
    pub(crate) fn observables(&self) -> Vec<Observable> {
        self.current.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.current.len()
    }
}
