//! Unified error type for roomsync clients.

use roomsync_network::NetworkError;
use roomsync_protocol::ProtocolError;
use roomsync_replication::ReplicationError;
use roomsync_session::{PreferencesError, SessionError};

/// Top-level error wrapping every crate-specific error.
///
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Lifecycle misuse or a refused privileged action.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Replication(#[from] ReplicationError),

    #[error(transparent)]
    Preferences(#[from] PreferencesError),

    /// The client config file couldn't be read.
    #[error("config i/o failed: {0}")]
    ConfigIo(#[source] std::io::Error),

    /// The client config file isn't valid JSON for [`crate::ClientConfig`].
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// The local peer's view-id block is used up.
    #[error("no free view ids left for this peer")]
    ViewIdsExhausted,
}
