//! Error types for the tracking core.
//!
//! Every core operation is total over well-formed input. The errors here only
//! surface through the checked variants (`try_pop_target`, `try_notify`) and
//! describe caller bugs: unbalanced tracking scopes and runaway re-entrant
//! notification.

use crate::reactive::ObservableId;

/// Errors reported by the checked tracking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    /// `pop_target` was called with no evaluation in progress.
    #[error("pop_target called with no evaluation in progress")]
    UnbalancedPop,

    /// Re-entrant notification nested deeper than the configured limit.
    ///
    /// This almost always means the dependency graph contains a cycle.
    #[error(
        "notification of observable {observable} nested {depth} levels deep (limit {limit}); \
         the dependency graph likely contains a cycle"
    )]
    NotifyDepthExceeded {
        observable: ObservableId,
        depth: usize,
        limit: usize,
    },
}

pub type Result<T> = std::result::Result<T, TrackError>;
