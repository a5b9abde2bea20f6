//! Error types for the session layer.

use roomsync_network::NetworkError;
use roomsync_protocol::ProtocolError;

use crate::SessionState;

/// Errors that can occur while driving the session lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request doesn't make sense in the current lifecycle state.
    /// For example, leaving a room while a join is still outstanding.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A privileged room action was attempted by a peer without authority.
    /// The action is refused, never attempted.
    #[error("local peer does not hold room authority")]
    NotAuthority,

    /// The operation needs the local peer to be inside a room.
    #[error("not in a room")]
    NotInRoom,

    /// Nicknames can't be empty.
    #[error("player name is empty")]
    EmptyNickname,

    /// The network service rejected a request.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Configured values didn't form valid protocol data.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading or writing local preferences failed.
    #[error(transparent)]
    Preferences(#[from] PreferencesError),
}

/// Errors from the local preference store.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("preferences i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preferences file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
