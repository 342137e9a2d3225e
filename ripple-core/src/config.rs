//! Process-wide tuning for the tracking core.
//!
//! The configuration is installed once (typically at startup) and read on
//! every notification pass. It lives in a lazily initialized global so that
//! observables never need a handle to it.

use std::sync::OnceLock;

use parking_lot::RwLock;

/// Default bound on re-entrant notification depth.
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 100;

static CONFIG: OnceLock<RwLock<TrackingConfig>> = OnceLock::new();

fn get_config() -> &'static RwLock<TrackingConfig> {
    CONFIG.get_or_init(|| RwLock::new(TrackingConfig::default()))
}

/// Tunables for dependency tracking and notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfig {
    /// How many `notify` passes may be nested inside one another on a single
    /// thread before the innermost pass is aborted.
    ///
    /// Nesting happens when a subscriber's re-evaluation synchronously writes
    /// to another observable. Acyclic graphs nest at most as deep as the
    /// longest dependency chain.
    pub max_notify_depth: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

impl TrackingConfig {
    /// Set the maximum nesting depth of notification passes.
    ///
    /// A value of zero is raised to one: a top-level pass always runs.
    pub fn with_max_notify_depth(mut self, depth: usize) -> Self {
        self.max_notify_depth = depth.max(1);
        self
    }

    /// Install this configuration for the whole process, returning the
    /// previously active one.
    pub fn install(self) -> TrackingConfig {
        tracing::debug!(max_notify_depth = self.max_notify_depth, "installing tracking config");
        std::mem::replace(&mut *get_config().write(), self)
    }

    /// The configuration currently in effect.
    pub fn current() -> TrackingConfig {
        *get_config().read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_depth() {
        assert_eq!(
            TrackingConfig::default().max_notify_depth,
            DEFAULT_MAX_NOTIFY_DEPTH
        );
    }

    #[test]
    fn zero_depth_is_clamped() {
        let config = TrackingConfig::default().with_max_notify_depth(0);
        assert_eq!(config.max_notify_depth, 1);
    }
}
