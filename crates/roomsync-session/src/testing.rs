//! A recording `NetworkService` for unit tests.

use std::collections::VecDeque;

use roomsync_network::{NetworkError, NetworkEvent, NetworkService, RoomSnapshot};
use roomsync_protocol::{
    GameVersion, PeerId, RoomName, RoomOptions, SceneTarget, TickPayload, ViewId,
};

/// A request the coordinator or handler made.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetVersion(String),
    SetAutoSync(bool),
    Connect,
    JoinRandom,
    CreateRoom { max_players: u8 },
    LeaveRoom,
    LoadLevel(SceneTarget),
}

/// Answers metadata queries from plain fields and records every request.
#[derive(Debug, Default)]
pub(crate) struct FakeNetwork {
    pub connected: bool,
    pub offline: bool,
    pub master: bool,
    /// `Some(n)` means "in a room with n players".
    pub player_count: Option<u8>,
    pub nickname: String,
    pub calls: Vec<Call>,
    pub events: VecDeque<NetworkEvent>,
}

impl FakeNetwork {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn in_room(player_count: u8, master: bool) -> Self {
        Self {
            connected: true,
            master,
            player_count: Some(player_count),
            ..Self::default()
        }
    }

    /// Calls that touch the room directory or scenes (ignores setters).
    pub fn room_actions(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::SetVersion(_) | Call::SetAutoSync(_)))
            .cloned()
            .collect()
    }
}

impl NetworkService for FakeNetwork {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_offline(&self) -> bool {
        self.offline
    }

    fn is_master(&self) -> bool {
        self.master
    }

    fn local_peer(&self) -> Option<PeerId> {
        Some(PeerId(1))
    }

    fn current_room(&self) -> Option<RoomSnapshot> {
        self.player_count.map(|player_count| RoomSnapshot {
            name: RoomName("fake".into()),
            player_count,
            max_players: 4,
            master: if self.master { PeerId(1) } else { PeerId(2) },
        })
    }

    fn set_game_version(&mut self, version: GameVersion) {
        self.calls.push(Call::SetVersion(version.0));
    }

    fn set_nickname(&mut self, nickname: &str) {
        self.nickname = nickname.to_string();
    }

    fn nickname(&self) -> String {
        self.nickname.clone()
    }

    fn set_auto_sync_scene(&mut self, enabled: bool) {
        self.calls.push(Call::SetAutoSync(enabled));
    }

    fn connect(&mut self) -> Result<(), NetworkError> {
        self.calls.push(Call::Connect);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.connected = false;
        Ok(())
    }

    fn join_random_room(&mut self) -> Result<(), NetworkError> {
        self.calls.push(Call::JoinRandom);
        Ok(())
    }

    fn create_room(&mut self, options: RoomOptions) -> Result<(), NetworkError> {
        self.calls.push(Call::CreateRoom {
            max_players: options.max_players(),
        });
        Ok(())
    }

    fn leave_room(&mut self) -> Result<(), NetworkError> {
        self.calls.push(Call::LeaveRoom);
        Ok(())
    }

    fn load_level(&mut self, target: &SceneTarget) -> Result<(), NetworkError> {
        self.calls.push(Call::LoadLevel(target.clone()));
        Ok(())
    }

    fn send_tick(&mut self, _view: ViewId, _payload: TickPayload) -> Result<(), NetworkError> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        self.events.pop_front()
    }
}
