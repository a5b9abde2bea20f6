//! Session types: lifecycle state, configuration, and the launcher
//! affordance the UI mirrors.

use std::fmt;

use roomsync_protocol::{GameVersion, ProtocolError, RoomOptions};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session lifecycle.
///
/// Every field has a default, so a config file only needs to mention what
/// it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Room capacity used when this client has to create a room.
    /// Must be 1..=255; 0 is raised to 1 by [`validated`](Self::validated).
    pub max_players: u8,

    /// Compatibility tag. Clients with different tags never share a room.
    pub game_version: String,

    /// Follow the master's scene loads automatically.
    pub auto_sync_scene: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_players: 4,
            game_version: "1".to_string(),
            auto_sync_scene: true,
        }
    }
}

impl SessionConfig {
    /// Fixes out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.max_players == 0 {
            tracing::warn!("max_players is 0, raising to 1");
            self.max_players = 1;
        }
        self
    }

    pub fn game_version(&self) -> GameVersion {
        GameVersion::new(self.game_version.clone())
    }

    /// Options for a create-room request: capacity only, no name.
    pub fn room_options(&self) -> Result<RoomOptions, ProtocolError> {
        RoomOptions::new(self.max_players)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
/// Disconnected ──request_connect──→ Connecting ──ConnectedToMaster──→ JoiningRandomRoom
///                                                                       │         │
///                                                          JoinRandomFailed     JoinedRoom
///                                                                       ▼         │
///                                                              CreatingRoom ──────┤
///                                                                                 ▼
/// ConnectedToMaster / Disconnected ←──LeftRoom── LeavingRoom ←──request_leave── InRoom
/// ```
///
/// `ConnectedToMaster` is also a resting state: connected, but nobody
/// asked to join anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    ConnectedToMaster,
    JoiningRandomRoom,
    CreatingRoom,
    InRoom,
    LeavingRoom,
}

impl SessionState {
    /// Whether a join-or-create sequence is in flight.
    pub fn is_joining(&self) -> bool {
        matches!(self, Self::Connecting | Self::JoiningRandomRoom | Self::CreatingRoom)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::ConnectedToMaster => "ConnectedToMaster",
            Self::JoiningRandomRoom => "JoiningRandomRoom",
            Self::CreatingRoom => "CreatingRoom",
            Self::InRoom => "InRoom",
            Self::LeavingRoom => "LeavingRoom",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Affordance
// ---------------------------------------------------------------------------

/// What the launcher UI should show.
///
/// `Idle` is the name/connect panel; `Connecting` is the progress label.
/// The coordinator flips this; rendering it is the UI's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affordance {
    #[default]
    Idle,
    Connecting,
}
