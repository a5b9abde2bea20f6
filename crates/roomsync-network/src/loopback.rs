//! In-process relay: a room directory and per-peer event inboxes behind one
//! mutex.
//!
//! [`LoopbackRelay`] stands in for the real relay network in tests, the
//! demo, and offline play. Each [`LoopbackService`] handed out by
//! [`LoopbackRelay::client`] is one peer's [`NetworkService`]. Requests
//! mutate the shared state immediately; their outcomes are queued as
//! events in the affected peers' inboxes and come out of `poll_event` in
//! FIFO order.
//!
//! Tick payloads are encoded once at send time and decoded per receiver,
//! so they cross the relay as bytes just like they would on a wire.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use roomsync_protocol::{
    Codec, DisconnectCause, GameVersion, JsonCodec, PeerId, RoomName,
    RoomOptions, SceneTarget, TickPayload, ViewId,
};

use crate::{NetworkError, NetworkEvent, NetworkService, PeerInfo, RoomSnapshot};

/// Error code reported with `JoinRandomFailed` when nothing matched.
pub const NO_RANDOM_MATCH_FOUND: i16 = 32760;

/// Something waiting in a peer's inbox.
enum Queued {
    Event(NetworkEvent),
    /// Ticks stay encoded until the receiver polls them.
    Tick {
        view: ViewId,
        sender: PeerId,
        bytes: Arc<[u8]>,
    },
}

struct PeerSlot {
    nickname: String,
    version: GameVersion,
    connected: bool,
    auto_sync_scene: bool,
    room: Option<RoomName>,
    inbox: VecDeque<Queued>,
}

impl PeerSlot {
    fn info(&self, id: PeerId) -> PeerInfo {
        PeerInfo {
            id,
            nickname: self.nickname.clone(),
        }
    }
}

struct RoomEntry {
    version: GameVersion,
    max_players: u8,
    /// Members in join order. The first one inherits authority when the
    /// master leaves.
    members: Vec<PeerId>,
    master: PeerId,
    scene: Option<SceneTarget>,
}

impl RoomEntry {
    fn has_space(&self) -> bool {
        self.members.len() < usize::from(self.max_players)
    }

    fn snapshot(&self, name: &RoomName) -> RoomSnapshot {
        RoomSnapshot {
            name: name.clone(),
            // Bounded by max_players, which is a u8.
            player_count: u8::try_from(self.members.len()).unwrap_or(u8::MAX),
            max_players: self.max_players,
            master: self.master,
        }
    }
}

#[derive(Default)]
struct RelayState {
    next_peer: u32,
    peers: HashMap<PeerId, PeerSlot>,
    /// Ordered so random-join candidates are listed deterministically
    /// before one is picked.
    rooms: BTreeMap<String, RoomEntry>,
}

impl RelayState {
    fn push(&mut self, peer: PeerId, item: Queued) {
        if let Some(slot) = self.peers.get_mut(&peer) {
            slot.inbox.push_back(item);
        }
    }

    fn push_event(&mut self, peer: PeerId, event: NetworkEvent) {
        self.push(peer, Queued::Event(event));
    }

    fn slot(&self, peer: PeerId) -> Result<&PeerSlot, NetworkError> {
        self.peers.get(&peer).ok_or(NetworkError::NotConnected)
    }

    /// The peer must be connected and outside any room.
    fn require_lobby(&self, peer: PeerId) -> Result<(), NetworkError> {
        let slot = self.slot(peer)?;
        if !slot.connected {
            return Err(NetworkError::NotConnected);
        }
        if let Some(room) = &slot.room {
            return Err(NetworkError::AlreadyInRoom(room.0.clone()));
        }
        Ok(())
    }

    /// The peer must be inside a room; returns the room's key.
    fn require_room(&self, peer: PeerId) -> Result<String, NetworkError> {
        let slot = self.slot(peer)?;
        if !slot.connected {
            return Err(NetworkError::NotConnected);
        }
        slot.room
            .as_ref()
            .map(|r| r.0.clone())
            .ok_or(NetworkError::NotInRoom)
    }

    fn fresh_room_name(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; 6] = rng.random();
            let name: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            if !self.rooms.contains_key(&name) {
                return name;
            }
        }
    }

    fn enter_room(&mut self, peer: PeerId, key: &str) {
        let Some(room) = self.rooms.get_mut(key) else {
            return;
        };
        let others: Vec<PeerId> = room.members.clone();
        room.members.push(peer);
        let scene = room.scene.clone();
        let player_count = room.members.len();

        let Some(slot) = self.peers.get_mut(&peer) else {
            return;
        };
        slot.room = Some(RoomName(key.to_string()));
        let info = slot.info(peer);
        let auto_sync = slot.auto_sync_scene;

        tracing::info!(%peer, room = key, player_count, "peer entered room");

        self.push_event(peer, NetworkEvent::JoinedRoom);
        if auto_sync {
            if let Some(scene) = scene {
                self.push_event(peer, NetworkEvent::SceneChanged(scene));
            }
        }
        for other in others {
            self.push_event(other, NetworkEvent::PlayerEntered(info.clone()));
        }
    }

    /// Takes the peer out of its room, notifying the remaining members and
    /// handing authority on if the master left. Empty rooms are dropped.
    fn exit_room(&mut self, peer: PeerId) {
        let Some(key) = self
            .peers
            .get_mut(&peer)
            .and_then(|slot| slot.room.take())
            .map(|r| r.0)
        else {
            return;
        };
        let Some(info) = self.peers.get(&peer).map(|s| s.info(peer)) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&key) else {
            return;
        };

        room.members.retain(|m| *m != peer);
        if room.members.is_empty() {
            self.rooms.remove(&key);
            tracing::info!(room = %key, "room closed (empty)");
            return;
        }

        let remaining = room.members.clone();
        let new_master = if room.master == peer {
            room.master = remaining[0];
            Some(room.master)
        } else {
            None
        };

        tracing::info!(%peer, room = %key, remaining = remaining.len(), "peer left room");

        for other in &remaining {
            self.push_event(*other, NetworkEvent::PlayerLeft(info.clone()));
        }
        if let Some(master) = new_master {
            tracing::info!(%master, room = %key, "authority reassigned");
            for other in &remaining {
                self.push_event(*other, NetworkEvent::MasterSwitched(master));
            }
        }
    }

    fn drop_connection(&mut self, peer: PeerId, cause: DisconnectCause) {
        self.exit_room(peer);
        if let Some(slot) = self.peers.get_mut(&peer) {
            slot.connected = false;
        }
        self.push_event(peer, NetworkEvent::Disconnected(cause));
    }
}

/// Handle to a shared in-process relay. Cheap to clone.
#[derive(Clone, Default)]
pub struct LoopbackRelay {
    state: Arc<Mutex<RelayState>>,
}

impl LoopbackRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new peer and returns its service handle. The peer starts
    /// disconnected.
    pub fn client(&self) -> LoopbackService {
        self.client_with_mode(false)
    }

    /// A service on its own private relay that reports itself offline.
    pub fn offline() -> LoopbackService {
        Self::new().client_with_mode(true)
    }

    fn client_with_mode(&self, offline: bool) -> LoopbackService {
        let mut state = lock(&self.state);
        state.next_peer += 1;
        let peer = PeerId(state.next_peer);
        state.peers.insert(
            peer,
            PeerSlot {
                nickname: String::new(),
                version: GameVersion::new(""),
                connected: false,
                auto_sync_scene: false,
                room: None,
                inbox: VecDeque::new(),
            },
        );
        LoopbackService {
            state: Arc::clone(&self.state),
            peer,
            offline,
            codec: JsonCodec,
        }
    }

    /// Drops a peer's connection from the relay side, as a timeout would.
    pub fn kick(&self, peer: PeerId, cause: DisconnectCause) {
        let mut state = lock(&self.state);
        tracing::warn!(%peer, %cause, "relay dropping peer");
        state.drop_connection(peer, cause);
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        lock(&self.state).rooms.len()
    }
}

/// One peer's connection to a [`LoopbackRelay`].
pub struct LoopbackService {
    state: Arc<Mutex<RelayState>>,
    peer: PeerId,
    offline: bool,
    codec: JsonCodec,
}

impl LoopbackService {
    /// The id the relay assigned to this peer. Known before connecting.
    pub fn peer_id(&self) -> PeerId {
        self.peer
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        lock(&self.state)
    }
}

/// A poisoned lock only means another client panicked mid-request; the
/// directory itself is still usable.
fn lock(state: &Mutex<RelayState>) -> MutexGuard<'_, RelayState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NetworkService for LoopbackService {
    fn is_connected(&self) -> bool {
        self.lock()
            .peers
            .get(&self.peer)
            .is_some_and(|s| s.connected)
    }

    fn is_offline(&self) -> bool {
        self.offline
    }

    fn is_master(&self) -> bool {
        let state = self.lock();
        state
            .peers
            .get(&self.peer)
            .and_then(|s| s.room.as_ref())
            .and_then(|r| state.rooms.get(&r.0))
            .is_some_and(|room| room.master == self.peer)
    }

    fn local_peer(&self) -> Option<PeerId> {
        Some(self.peer)
    }

    fn current_room(&self) -> Option<RoomSnapshot> {
        let state = self.lock();
        let name = state.peers.get(&self.peer)?.room.clone()?;
        state.rooms.get(&name.0).map(|room| room.snapshot(&name))
    }

    fn set_game_version(&mut self, version: GameVersion) {
        if let Some(slot) = self.lock().peers.get_mut(&self.peer) {
            slot.version = version;
        }
    }

    fn set_nickname(&mut self, nickname: &str) {
        if let Some(slot) = self.lock().peers.get_mut(&self.peer) {
            slot.nickname = nickname.to_string();
        }
    }

    fn nickname(&self) -> String {
        self.lock()
            .peers
            .get(&self.peer)
            .map(|s| s.nickname.clone())
            .unwrap_or_default()
    }

    fn set_auto_sync_scene(&mut self, enabled: bool) {
        if let Some(slot) = self.lock().peers.get_mut(&self.peer) {
            slot.auto_sync_scene = enabled;
        }
    }

    fn connect(&mut self) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        let slot = state.peers.get_mut(&peer).ok_or(NetworkError::NotConnected)?;
        if slot.connected {
            return Err(NetworkError::AlreadyConnected);
        }
        slot.connected = true;
        tracing::info!(%peer, version = %slot.version, offline = self.offline, "peer connected");
        state.push_event(peer, NetworkEvent::ConnectedToMaster);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        if !state.slot(peer)?.connected {
            return Err(NetworkError::NotConnected);
        }
        state.drop_connection(peer, DisconnectCause::ClientRequest);
        Ok(())
    }

    fn join_random_room(&mut self) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        state.require_lobby(peer)?;
        let version = state.slot(peer)?.version.clone();

        let candidates: Vec<String> = state
            .rooms
            .iter()
            .filter(|(_, room)| room.version == version && room.has_space())
            .map(|(key, _)| key.clone())
            .collect();

        if candidates.is_empty() {
            tracing::debug!(%peer, %version, "no joinable room");
            state.push_event(
                peer,
                NetworkEvent::JoinRandomFailed {
                    code: NO_RANDOM_MATCH_FOUND,
                    message: "No match found".to_string(),
                },
            );
            return Ok(());
        }

        let pick = rand::rng().random_range(0..candidates.len());
        state.enter_room(peer, &candidates[pick]);
        Ok(())
    }

    fn create_room(&mut self, options: RoomOptions) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        state.require_lobby(peer)?;
        let version = state.slot(peer)?.version.clone();

        let key = state.fresh_room_name();
        state.rooms.insert(
            key.clone(),
            RoomEntry {
                version,
                max_players: options.max_players(),
                members: Vec::new(),
                master: peer,
                scene: None,
            },
        );
        tracing::info!(%peer, room = %key, max_players = options.max_players(), "room created");
        state.enter_room(peer, &key);
        Ok(())
    }

    fn leave_room(&mut self) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        state.require_room(peer)?;
        state.exit_room(peer);
        // Leaving a room lands the peer back on the master server.
        state.push_event(peer, NetworkEvent::LeftRoom);
        state.push_event(peer, NetworkEvent::ConnectedToMaster);
        Ok(())
    }

    fn load_level(&mut self, target: &SceneTarget) -> Result<(), NetworkError> {
        let peer = self.peer;
        let mut state = self.lock();
        let key = state.require_room(peer)?;
        let Some(room) = state.rooms.get_mut(&key) else {
            return Err(NetworkError::NotInRoom);
        };
        room.scene = Some(target.clone());
        let members = room.members.clone();

        for member in members {
            let syncs = member == peer
                || state.peers.get(&member).is_some_and(|s| s.auto_sync_scene);
            if syncs {
                state.push_event(member, NetworkEvent::SceneChanged(target.clone()));
            }
        }
        Ok(())
    }

    fn send_tick(&mut self, view: ViewId, payload: TickPayload) -> Result<(), NetworkError> {
        let peer = self.peer;
        let bytes: Arc<[u8]> = self.codec.encode(&payload)?.into();
        let mut state = self.lock();
        let key = state.require_room(peer)?;
        let members = state
            .rooms
            .get(&key)
            .map(|room| room.members.clone())
            .unwrap_or_default();

        for member in members.into_iter().filter(|m| *m != peer) {
            state.push(
                member,
                Queued::Tick {
                    view,
                    sender: peer,
                    bytes: Arc::clone(&bytes),
                },
            );
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        loop {
            let item = self.lock().peers.get_mut(&self.peer)?.inbox.pop_front()?;
            match item {
                Queued::Event(event) => return Some(event),
                Queued::Tick { view, sender, bytes } => {
                    match self.codec.decode::<TickPayload>(&bytes) {
                        Ok(payload) => {
                            return Some(NetworkEvent::Tick { view, sender, payload });
                        }
                        Err(e) => {
                            tracing::warn!(%view, %sender, error = %e, "dropping undecodable tick");
                        }
                    }
                }
            }
        }
    }
}
