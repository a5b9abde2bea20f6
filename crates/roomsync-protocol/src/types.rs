//! Core protocol types shared by the session and replication layers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one peer (client) inside the relay network.
///
/// The relay assigns these; the core only compares and logs them. The
/// newtype keeps a `PeerId` from being confused with a `ViewId`, even
/// though both are plain integers underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifies one networked entity binding (an avatar, a projectile...).
///
/// A tick carries no entity id of its own: the relay routes it by the
/// `ViewId` it was sent under, and both ends agree on what that view is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V-{}", self.0)
    }
}

/// A room's name. Always assigned by the network service, never chosen
/// by this client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client compatibility tag.
///
/// Peers with different tags are never matched into the same room, so a
/// breaking change only needs a bump here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameVersion(pub String);

impl GameVersion {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SceneTarget
// ---------------------------------------------------------------------------

/// What a level load points at: a build index or a named scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneTarget {
    Index(u32),
    Name(String),
}

impl SceneTarget {
    /// The application's entry scene, loaded after leaving a room.
    pub const ENTRY: Self = Self::Index(0);

    /// The level seeded by the first peer to arrive in a fresh room.
    pub const FIRST_SEED: Self = Self::Index(1);

    /// The arena scene for a given occupancy: `"Room for {player_count}"`.
    pub fn for_player_count(player_count: u8) -> Self {
        Self::Name(format!("Room for {player_count}"))
    }
}

impl fmt::Display for SceneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomOptions
// ---------------------------------------------------------------------------

/// Parameters sent with a create-room request.
///
/// There is deliberately no name field: the service assigns one.
/// `max_players` is fixed for the room's lifetime once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOptions {
    max_players: u8,
}

impl RoomOptions {
    /// Builds room options, rejecting `max_players == 0`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMaxPlayers`] for zero.
    pub fn new(max_players: u8) -> Result<Self, ProtocolError> {
        if max_players == 0 {
            return Err(ProtocolError::InvalidMaxPlayers(max_players));
        }
        Ok(Self { max_players })
    }

    pub fn max_players(&self) -> u8 {
        self.max_players
    }
}

// ---------------------------------------------------------------------------
// DisconnectCause
// ---------------------------------------------------------------------------

/// Why the network service dropped the connection.
///
/// Reported on the `Disconnected` event. None of these are retried
/// automatically; the user has to ask to connect again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectCause {
    /// This client asked to disconnect.
    ClientRequest,
    /// The server stopped hearing from us.
    ServerTimeout,
    /// We stopped hearing from the server.
    ClientTimeout,
    /// The initial connect never completed.
    ExceptionOnConnect,
    /// The server refused us because it's at capacity.
    MaxCapacityReached,
    /// The server closed the connection.
    DisconnectByServer,
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientRequest => "client request",
            Self::ServerTimeout => "server timeout",
            Self::ClientTimeout => "client timeout",
            Self::ExceptionOnConnect => "exception on connect",
            Self::MaxCapacityReached => "max capacity reached",
            Self::DisconnectByServer => "disconnected by server",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// SyncValue / TickPayload
// ---------------------------------------------------------------------------

/// One value in a replication tick.
///
/// A tick is just these values in the order the owner wrote them. The
/// reader must pull them back out in the same order and as the same
/// kinds; [`TryFrom`] reports a [`ProtocolError::TypeMismatch`] otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncValue {
    Bool(bool),
    Float(f32),
    Int(i32),
    UInt(u32),
}

impl SyncValue {
    /// Short name of the value's kind, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Float(_) => "f32",
            Self::Int(_) => "i32",
            Self::UInt(_) => "u32",
        }
    }
}

impl From<bool> for SyncValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for SyncValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for SyncValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for SyncValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

macro_rules! sync_value_try_from {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl TryFrom<SyncValue> for $ty {
            type Error = ProtocolError;

            fn try_from(value: SyncValue) -> Result<Self, Self::Error> {
                match value {
                    SyncValue::$variant(v) => Ok(v),
                    other => Err(ProtocolError::TypeMismatch {
                        expected: $name,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

sync_value_try_from!(bool, Bool, "bool");
sync_value_try_from!(f32, Float, "f32");
sync_value_try_from!(i32, Int, "i32");
sync_value_try_from!(u32, UInt, "u32");

/// The full contents of one entity's tick, in write order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickPayload(pub Vec<SyncValue>);

impl TickPayload {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PeerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PeerId(7).to_string(), "P-7");
        assert_eq!(ViewId(1001).to_string(), "V-1001");
        assert_eq!(RoomName("a1b2".into()).to_string(), "a1b2");
    }

    #[test]
    fn test_scene_target_for_player_count_uses_room_for_format() {
        assert_eq!(
            SceneTarget::for_player_count(3),
            SceneTarget::Name("Room for 3".into())
        );
    }

    #[test]
    fn test_scene_target_fixed_indices() {
        assert_eq!(SceneTarget::ENTRY, SceneTarget::Index(0));
        assert_eq!(SceneTarget::FIRST_SEED, SceneTarget::Index(1));
    }

    #[test]
    fn test_scene_target_display() {
        assert_eq!(SceneTarget::Index(1).to_string(), "#1");
        assert_eq!(SceneTarget::for_player_count(2).to_string(), "\"Room for 2\"");
    }

    #[test]
    fn test_room_options_rejects_zero_players() {
        assert!(matches!(
            RoomOptions::new(0),
            Err(ProtocolError::InvalidMaxPlayers(0))
        ));
    }

    #[test]
    fn test_room_options_accepts_full_range() {
        assert_eq!(RoomOptions::new(1).unwrap().max_players(), 1);
        assert_eq!(RoomOptions::new(255).unwrap().max_players(), 255);
    }

    #[test]
    fn test_sync_value_try_from_matching_kind() {
        let b: bool = SyncValue::Bool(true).try_into().unwrap();
        let f: f32 = SyncValue::Float(0.25).try_into().unwrap();
        assert!(b);
        assert_eq!(f, 0.25);
    }

    #[test]
    fn test_sync_value_try_from_wrong_kind_reports_both_kinds() {
        let result: Result<bool, _> = SyncValue::Float(1.0).try_into();
        match result {
            Err(ProtocolError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "bool");
                assert_eq!(found, "f32");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_disconnect_cause_display() {
        assert_eq!(DisconnectCause::ClientRequest.to_string(), "client request");
        assert_eq!(DisconnectCause::ServerTimeout.to_string(), "server timeout");
    }

    #[test]
    fn test_game_version_serializes_as_plain_string() {
        let json = serde_json::to_string(&GameVersion::new("1")).unwrap();
        assert_eq!(json, "\"1\"");
    }
}
