//! Error types for the replication layer.

use roomsync_protocol::{ProtocolError, ViewId};

/// Errors raised while capturing or applying replication ticks.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// A value in the tick was read as the wrong kind.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The reader asked for more values than the tick carries.
    #[error("tick payload exhausted after {read} values")]
    Exhausted { read: usize },

    /// The reader finished with values left over.
    #[error("tick payload has {remaining} unread values")]
    TrailingValues { remaining: usize },

    /// Only the owning peer may capture an entity's state.
    #[error("entity {0} is not owned by the local peer")]
    NotOwner(ViewId),

    /// An entity with this view id is already registered.
    #[error("entity {0} is already registered")]
    DuplicateView(ViewId),
}
