use roomsync_protocol::ProtocolError;

/// Errors returned when a request can't even be handed to the relay.
///
/// Most failures in a room-based relay arrive later as events
/// (`JoinRandomFailed`, `Disconnected`...). These are the synchronous
/// rejections: the request made no sense in the client's current state.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The operation needs a live connection.
    #[error("not connected to the network service")]
    NotConnected,

    /// `connect` was called while already connected.
    #[error("already connected to the network service")]
    AlreadyConnected,

    /// The operation needs the client to be inside a room.
    #[error("not in a room")]
    NotInRoom,

    /// Join/create was requested while already inside a room.
    #[error("already in room {0}")]
    AlreadyInRoom(String),

    /// A tick payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
