//! Network service abstraction for roomsync.
//!
//! The relay itself (delivery, NAT traversal, room directory storage) is
//! somebody else's job. This crate defines the seam the client talks
//! through:
//!
//! - [`NetworkService`]: fire-and-forget requests (connect, join-random,
//!   create, leave, load level, send tick) plus authority metadata.
//! - [`NetworkEvent`]: everything the service reports back, drained in
//!   FIFO order through [`NetworkService::poll_event`].
//! - [`LoopbackRelay`]: an in-process relay for tests, demos and offline
//!   play.

mod error;
mod loopback;

pub use error::NetworkError;
pub use loopback::{LoopbackRelay, LoopbackService, NO_RANDOM_MATCH_FOUND};

use roomsync_protocol::{
    DisconnectCause, GameVersion, PeerId, RoomName, RoomOptions, SceneTarget,
    TickPayload, ViewId,
};

/// A peer as seen in membership notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub nickname: String,
}

/// Read-only view of the room the local peer is in.
///
/// `player_count` is owned by the service; a snapshot is only as fresh as
/// the moment it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub player_count: u8,
    pub max_players: u8,
    pub master: PeerId,
}

/// Something the network service wants the client to know about.
///
/// These replace per-callback method overrides: the client drains them
/// one at a time and routes each to the component that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// Connected (or returned) to the master server; room operations are
    /// now possible.
    ConnectedToMaster,
    /// No joinable room matched a random-join request.
    JoinRandomFailed { code: i16, message: String },
    /// The service refused to create a room.
    CreateRoomFailed { code: i16, message: String },
    /// The local peer is now inside a room.
    JoinedRoom,
    /// A remote peer joined the local peer's room.
    PlayerEntered(PeerInfo),
    /// A remote peer left the local peer's room.
    PlayerLeft(PeerInfo),
    /// Authority moved to another peer.
    MasterSwitched(PeerId),
    /// The room's synced scene changed; load it locally.
    SceneChanged(SceneTarget),
    /// One replication tick for a networked entity.
    Tick {
        view: ViewId,
        sender: PeerId,
        payload: TickPayload,
    },
    /// The local peer left its room.
    LeftRoom,
    /// The connection is gone.
    Disconnected(DisconnectCause),
}

impl NetworkEvent {
    /// Variant name, for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectedToMaster => "ConnectedToMaster",
            Self::JoinRandomFailed { .. } => "JoinRandomFailed",
            Self::CreateRoomFailed { .. } => "CreateRoomFailed",
            Self::JoinedRoom => "JoinedRoom",
            Self::PlayerEntered(_) => "PlayerEntered",
            Self::PlayerLeft(_) => "PlayerLeft",
            Self::MasterSwitched(_) => "MasterSwitched",
            Self::SceneChanged(_) => "SceneChanged",
            Self::Tick { .. } => "Tick",
            Self::LeftRoom => "LeftRoom",
            Self::Disconnected(_) => "Disconnected",
        }
    }
}

/// The capability the client needs from a room-based relay network.
///
/// Every request is fire-and-forget. An `Ok` only means the request was
/// handed over; its outcome arrives later as a [`NetworkEvent`]. An `Err`
/// means the request was rejected outright.
///
/// `is_master` and `current_room` reflect state owned by the service.
/// The client only reads them and must expect them to change between
/// two calls.
pub trait NetworkService {
    /// Whether a connection to the master server (or a room) is up.
    fn is_connected(&self) -> bool;

    /// Whether the service is running without a real network.
    fn is_offline(&self) -> bool;

    /// Whether the local peer currently holds room authority.
    fn is_master(&self) -> bool;

    /// The local peer's id, once known.
    fn local_peer(&self) -> Option<PeerId>;

    /// The room the local peer is in, if any.
    fn current_room(&self) -> Option<RoomSnapshot>;

    /// Sets the compatibility tag used for matchmaking.
    fn set_game_version(&mut self, version: GameVersion);

    /// Sets the nickname other peers see.
    fn set_nickname(&mut self, nickname: &str);

    /// The nickname other peers see.
    fn nickname(&self) -> String;

    /// When enabled, scene loads issued by the master are replayed on
    /// this client as [`NetworkEvent::SceneChanged`].
    fn set_auto_sync_scene(&mut self, enabled: bool);

    fn connect(&mut self) -> Result<(), NetworkError>;

    fn disconnect(&mut self) -> Result<(), NetworkError>;

    fn join_random_room(&mut self) -> Result<(), NetworkError>;

    /// Creates a room; the service picks its name.
    fn create_room(&mut self, options: RoomOptions) -> Result<(), NetworkError>;

    fn leave_room(&mut self) -> Result<(), NetworkError>;

    /// Loads a level on every peer in the room (the caller included).
    fn load_level(&mut self, target: &SceneTarget) -> Result<(), NetworkError>;

    /// Broadcasts one tick for `view` to every other peer in the room.
    fn send_tick(&mut self, view: ViewId, payload: TickPayload) -> Result<(), NetworkError>;

    /// Next buffered event, in arrival order.
    fn poll_event(&mut self) -> Option<NetworkEvent>;
}
