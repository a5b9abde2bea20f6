//! The session coordinator: connect → join-or-create → in-room → leave.
//!
//! Matchmaking is optimistic: always try to join a random room first, and
//! only create one when the service reports there was nothing to join.
//! A failed random join is the *expected* miss and is never retried; it
//! leads straight to exactly one create-room request.
//!
//! The coordinator never blocks. Every request it makes completes later as
//! a [`NetworkEvent`], which the client feeds back through
//! [`SessionCoordinator::handle_event`].

use roomsync_network::{NetworkEvent, NetworkService};
use roomsync_protocol::{DisconnectCause, SceneTarget};

use crate::{Affordance, SceneLoader, SessionConfig, SessionError, SessionState};

/// Drives one client's session lifecycle.
///
/// ## Fields worth knowing about
///
/// - `should_connect` latches the user's intent to play. It is set by
///   [`request_connect`](Self::request_connect) when a connection has to
///   be opened first, and cleared by the very next `ConnectedToMaster`,
///   whichever branch that takes. Returning to the master server after
///   leaving a room therefore does nothing unless the user asks again.
/// - `pending_room_request` is true from the join-random request until the
///   room is joined (or creation fails, or the connection drops).
pub struct SessionCoordinator {
    config: SessionConfig,
    state: SessionState,
    should_connect: bool,
    pending_room_request: bool,
    affordance: Affordance,
}

impl SessionCoordinator {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: config.validated(),
            state: SessionState::Disconnected,
            should_connect: false,
            pending_room_request: false,
            affordance: Affordance::Idle,
        }
    }

    /// One-time setup on the service before anything else happens.
    pub fn prepare<N: NetworkService>(&self, net: &mut N) {
        net.set_auto_sync_scene(self.config.auto_sync_scene);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn should_connect(&self) -> bool {
        self.should_connect
    }

    pub fn pending_room_request(&self) -> bool {
        self.pending_room_request
    }

    pub fn affordance(&self) -> Affordance {
        self.affordance
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // =====================================================================
    // User requests
    // =====================================================================

    /// Starts playing: join a random room if connected, otherwise connect
    /// first and join once the master server answers.
    ///
    /// # Errors
    /// - [`SessionError::InvalidState`] if a connection or join is already
    ///   in flight, or the peer is already in a room.
    /// - [`SessionError::Network`] if the service rejects the request.
    pub fn request_connect<N: NetworkService>(&mut self, net: &mut N) -> Result<(), SessionError> {
        let busy = self.pending_room_request
            || self.state.is_joining()
            || matches!(self.state, SessionState::InRoom | SessionState::LeavingRoom);
        if busy {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }

        self.affordance = Affordance::Connecting;

        let result = if net.is_connected() {
            tracing::info!("already connected, joining a random room");
            self.join_random(net)
        } else {
            self.should_connect = true;
            net.set_game_version(self.config.game_version());
            tracing::info!(version = %self.config.game_version, "connecting to network service");
            net.connect().map(|()| self.state = SessionState::Connecting)
        };

        if let Err(e) = result {
            self.reset_to_idle();
            return Err(e.into());
        }
        Ok(())
    }

    /// Leaves the current room. Completion arrives as `LeftRoom`.
    ///
    /// # Errors
    /// [`SessionError::InvalidState`] unless the peer is in a room. A join
    /// still in flight can't be cancelled this way.
    pub fn request_leave_room<N: NetworkService>(&mut self, net: &mut N) -> Result<(), SessionError> {
        if self.state != SessionState::InRoom {
            return Err(SessionError::InvalidState {
                operation: "leave room",
                state: self.state,
            });
        }
        net.leave_room()?;
        self.state = SessionState::LeavingRoom;
        tracing::info!("leaving room");
        Ok(())
    }

    // =====================================================================
    // Service events
    // =====================================================================

    /// Routes one event to its handler. Events the session doesn't care
    /// about (ticks, membership) are ignored.
    pub fn handle_event<N, S>(
        &mut self,
        event: &NetworkEvent,
        net: &mut N,
        scenes: &mut S,
    ) -> Result<(), SessionError>
    where
        N: NetworkService,
        S: SceneLoader,
    {
        match event {
            NetworkEvent::ConnectedToMaster => self.on_connected_to_master(net),
            NetworkEvent::JoinRandomFailed { code, message } => {
                self.on_join_random_failed(*code, message, net)
            }
            NetworkEvent::CreateRoomFailed { code, message } => {
                self.on_create_room_failed(*code, message);
                Ok(())
            }
            NetworkEvent::JoinedRoom => self.on_joined_room(net).map(|_| ()),
            NetworkEvent::Disconnected(cause) => {
                self.on_disconnected(*cause);
                Ok(())
            }
            NetworkEvent::LeftRoom => {
                self.on_left_room(net, scenes);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn on_connected_to_master<N: NetworkService>(&mut self, net: &mut N) -> Result<(), SessionError> {
        tracing::info!(should_connect = self.should_connect, "connected to master");
        self.state = SessionState::ConnectedToMaster;

        let wanted = std::mem::take(&mut self.should_connect);
        if wanted {
            if let Err(e) = self.join_random(net) {
                self.reset_to_idle();
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// No room to join: create one. Never retries the random join.
    pub fn on_join_random_failed<N: NetworkService>(
        &mut self,
        code: i16,
        message: &str,
        net: &mut N,
    ) -> Result<(), SessionError> {
        tracing::info!(code, message, "no random room available, creating one");

        let created = self
            .config
            .room_options()
            .map_err(SessionError::from)
            .and_then(|options| net.create_room(options).map_err(SessionError::from));

        match created {
            Ok(()) => {
                self.state = SessionState::CreatingRoom;
                self.pending_room_request = true;
                Ok(())
            }
            Err(e) => {
                self.reset_to_idle();
                Err(e)
            }
        }
    }

    pub fn on_create_room_failed(&mut self, code: i16, message: &str) {
        tracing::warn!(code, message, "room creation failed");
        self.reset_to_idle();
    }

    /// In a room. The first occupant of a live room seeds the level; later
    /// arrivals get the room's scene through auto-sync instead.
    ///
    /// Returns the level load that was requested, if any.
    pub fn on_joined_room<N: NetworkService>(&mut self, net: &mut N) -> Result<Option<SceneTarget>, SessionError> {
        self.state = SessionState::InRoom;
        self.pending_room_request = false;

        let Some(room) = net.current_room() else {
            tracing::warn!("joined room but the service reports no current room");
            return Ok(None);
        };
        tracing::info!(room = %room.name, player_count = room.player_count, "joined room");

        if room.player_count == 1 && !net.is_offline() {
            let target = SceneTarget::FIRST_SEED;
            tracing::info!(%target, "first in room, seeding level");
            net.load_level(&target)?;
            return Ok(Some(target));
        }
        Ok(None)
    }

    /// Connection gone. Reported, UI reset, no automatic reconnect.
    pub fn on_disconnected(&mut self, cause: DisconnectCause) {
        tracing::warn!(%cause, state = %self.state, "disconnected");
        self.state = SessionState::Disconnected;
        self.reset_to_idle();
    }

    /// Back out of the room: return to the entry scene.
    pub fn on_left_room<N: NetworkService, S: SceneLoader>(&mut self, net: &N, scenes: &mut S) {
        self.state = if net.is_connected() {
            SessionState::ConnectedToMaster
        } else {
            SessionState::Disconnected
        };
        self.pending_room_request = false;
        self.affordance = Affordance::Idle;
        tracing::info!("left room");
        scenes.load_scene(&SceneTarget::ENTRY);
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn join_random<N: NetworkService>(&mut self, net: &mut N) -> Result<(), roomsync_network::NetworkError> {
        net.join_random_room()?;
        self.state = SessionState::JoiningRandomRoom;
        self.pending_room_request = true;
        Ok(())
    }

    /// Drop any in-flight intent and show the connect panel again.
    fn reset_to_idle(&mut self) {
        self.should_connect = false;
        self.pending_room_request = false;
        self.affordance = Affordance::Idle;
        if self.state.is_joining() {
            self.state = SessionState::ConnectedToMaster;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Transition-table tests driven by a recording fake service.
    //!
    //! Naming: `test_{operation}_{scenario}_{expected}`.

    use super::*;
    use crate::SceneLog;
    use crate::testing::{Call, FakeNetwork};

    fn coordinator() -> SessionCoordinator {
        SessionCoordinator::new(SessionConfig::default())
    }

    fn fail_random() -> NetworkEvent {
        NetworkEvent::JoinRandomFailed {
            code: 32760,
            message: "No match found".into(),
        }
    }

    // =====================================================================
    // request_connect()
    // =====================================================================

    #[test]
    fn test_request_connect_when_disconnected_sets_intent_and_connects() {
        let mut c = coordinator();
        let mut net = FakeNetwork::default();

        c.request_connect(&mut net).unwrap();

        assert!(c.should_connect());
        assert_eq!(c.state(), SessionState::Connecting);
        assert_eq!(c.affordance(), Affordance::Connecting);
        assert_eq!(
            net.calls,
            vec![Call::SetVersion("1".into()), Call::Connect]
        );
    }

    #[test]
    fn test_request_connect_when_connected_joins_random_immediately() {
        let mut c = coordinator();
        let mut net = FakeNetwork::connected();

        c.request_connect(&mut net).unwrap();

        assert_eq!(net.calls, vec![Call::JoinRandom]);
        assert!(!c.should_connect(), "no connection step, nothing to latch");
        assert!(c.pending_room_request());
        assert_eq!(c.state(), SessionState::JoiningRandomRoom);
    }

    #[test]
    fn test_request_connect_while_joining_is_rejected() {
        let mut c = coordinator();
        let mut net = FakeNetwork::connected();
        c.request_connect(&mut net).unwrap();

        let result = c.request_connect(&mut net);

        assert!(matches!(result, Err(SessionError::InvalidState { .. })));
        assert_eq!(net.room_actions(), vec![Call::JoinRandom]);
    }

    #[test]
    fn test_request_connect_while_connecting_is_rejected() {
        let mut c = coordinator();
        let mut net = FakeNetwork::default();
        c.request_connect(&mut net).unwrap();
        // The service may already report the link as up before
        // ConnectedToMaster is delivered.
        net.connected = true;

        let result = c.request_connect(&mut net);

        assert!(matches!(
            result,
            Err(SessionError::InvalidState { state: SessionState::Connecting, .. })
        ));
        assert_eq!(c.state(), SessionState::Connecting);
        assert!(c.should_connect());
        assert_eq!(net.room_actions(), vec![Call::Connect]);

        c.on_connected_to_master(&mut net).unwrap();
        assert_eq!(net.room_actions(), vec![Call::Connect, Call::JoinRandom]);
    }

    // =====================================================================
    // on_connected_to_master()
    // =====================================================================

    #[test]
    fn test_connected_to_master_with_intent_joins_random_and_clears_intent() {
        let mut c = coordinator();
        let mut net = FakeNetwork::default();
        c.request_connect(&mut net).unwrap();
        net.connected = true;

        c.on_connected_to_master(&mut net).unwrap();

        assert!(!c.should_connect());
        assert_eq!(net.room_actions(), vec![Call::Connect, Call::JoinRandom]);
        assert_eq!(c.state(), SessionState::JoiningRandomRoom);
    }

    #[test]
    fn test_connected_to_master_without_intent_does_nothing() {
        // Typical after leaving a room: the service lands us back on the
        // master server, but nobody asked to play again.
        let mut c = coordinator();
        let mut net = FakeNetwork::connected();

        c.on_connected_to_master(&mut net).unwrap();

        assert!(net.room_actions().is_empty());
        assert!(!c.should_connect());
        assert_eq!(c.state(), SessionState::ConnectedToMaster);
    }

    #[test]
    fn test_connected_to_master_twice_joins_only_once() {
        let mut c = coordinator();
        let mut net = FakeNetwork::default();
        c.request_connect(&mut net).unwrap();
        net.connected = true;

        c.on_connected_to_master(&mut net).unwrap();
        c.on_connected_to_master(&mut net).unwrap();

        let joins = net.calls.iter().filter(|c| **c == Call::JoinRandom).count();
        assert_eq!(joins, 1);
    }

    // =====================================================================
    // on_join_random_failed()
    // =====================================================================

    #[test]
    fn test_join_random_failed_creates_exactly_one_room_with_configured_capacity() {
        let mut c = SessionCoordinator::new(SessionConfig {
            max_players: 6,
            ..SessionConfig::default()
        });
        let mut net = FakeNetwork::connected();
        c.request_connect(&mut net).unwrap();

        c.handle_event(&fail_random(), &mut net, &mut SceneLog::new()).unwrap();

        assert_eq!(
            net.room_actions(),
            vec![Call::JoinRandom, Call::CreateRoom { max_players: 6 }]
        );
        assert_eq!(c.state(), SessionState::CreatingRoom);
        assert!(c.pending_room_request());
    }

    #[test]
    fn test_create_room_failed_resets_to_idle() {
        let mut c = coordinator();
        let mut net = FakeNetwork::connected();
        c.request_connect(&mut net).unwrap();
        c.on_join_random_failed(32760, "none", &mut net).unwrap();

        c.on_create_room_failed(32766, "exists");

        assert!(!c.pending_room_request());
        assert_eq!(c.affordance(), Affordance::Idle);
        assert_eq!(c.state(), SessionState::ConnectedToMaster);
    }

    // =====================================================================
    // on_joined_room()
    // =====================================================================

    #[test]
    fn test_joined_room_first_occupant_live_seeds_level() {
        let mut c = coordinator();
        let mut net = FakeNetwork::in_room(1, true);

        let loaded = c.on_joined_room(&mut net).unwrap();

        assert_eq!(loaded, Some(SceneTarget::FIRST_SEED));
        assert_eq!(net.room_actions(), vec![Call::LoadLevel(SceneTarget::FIRST_SEED)]);
        assert_eq!(c.state(), SessionState::InRoom);
        assert!(!c.pending_room_request());
    }

    #[test]
    fn test_joined_room_existing_room_loads_nothing() {
        for count in 2..=4 {
            let mut c = coordinator();
            let mut net = FakeNetwork::in_room(count, false);

            let loaded = c.on_joined_room(&mut net).unwrap();

            assert_eq!(loaded, None, "player_count {count}");
            assert!(net.room_actions().is_empty());
        }
    }

    #[test]
    fn test_joined_room_offline_loads_nothing() {
        let mut c = coordinator();
        let mut net = FakeNetwork::in_room(1, true);
        net.offline = true;

        assert_eq!(c.on_joined_room(&mut net).unwrap(), None);
        assert!(net.room_actions().is_empty());
    }

    // =====================================================================
    // on_disconnected()
    // =====================================================================

    #[test]
    fn test_disconnected_resets_affordance_without_retry() {
        let mut c = coordinator();
        let mut net = FakeNetwork::default();
        c.request_connect(&mut net).unwrap();

        c.handle_event(
            &NetworkEvent::Disconnected(DisconnectCause::ExceptionOnConnect),
            &mut net,
            &mut SceneLog::new(),
        )
        .unwrap();

        assert_eq!(c.affordance(), Affordance::Idle);
        assert_eq!(c.state(), SessionState::Disconnected);
        assert!(!c.should_connect());
        assert_eq!(net.room_actions(), vec![Call::Connect], "no reconnect attempt");
    }

    // =====================================================================
    // request_leave_room() / on_left_room()
    // =====================================================================

    #[test]
    fn test_request_leave_room_outside_room_is_rejected() {
        let mut c = coordinator();
        let mut net = FakeNetwork::connected();
        c.request_connect(&mut net).unwrap();

        let result = c.request_leave_room(&mut net);

        assert!(matches!(
            result,
            Err(SessionError::InvalidState { state: SessionState::JoiningRandomRoom, .. })
        ));
        assert!(!net.calls.contains(&Call::LeaveRoom));
    }

    #[test]
    fn test_leave_then_left_room_loads_entry_scene() {
        let mut c = coordinator();
        let mut net = FakeNetwork::in_room(2, false);
        let mut scenes = SceneLog::new();
        c.on_joined_room(&mut net).unwrap();

        c.request_leave_room(&mut net).unwrap();
        assert_eq!(c.state(), SessionState::LeavingRoom);

        c.handle_event(&NetworkEvent::LeftRoom, &mut net, &mut scenes).unwrap();

        assert_eq!(scenes.loads(), &[SceneTarget::ENTRY]);
        assert_eq!(c.state(), SessionState::ConnectedToMaster);
    }

    // =====================================================================
    // Full scenario
    // =====================================================================

    #[test]
    fn test_scenario_first_peer_creates_room_and_seeds_once() {
        // max_players = 4; connect, random join misses, room is created,
        // we're the only occupant → exactly one first-seed level load.
        let mut c = coordinator();
        let mut net = FakeNetwork::default();
        let mut scenes = SceneLog::new();

        c.request_connect(&mut net).unwrap();
        net.connected = true;
        c.handle_event(&NetworkEvent::ConnectedToMaster, &mut net, &mut scenes).unwrap();
        c.handle_event(&fail_random(), &mut net, &mut scenes).unwrap();
        net.player_count = Some(1);
        net.master = true;
        c.handle_event(&NetworkEvent::JoinedRoom, &mut net, &mut scenes).unwrap();

        assert_eq!(
            net.room_actions(),
            vec![
                Call::Connect,
                Call::JoinRandom,
                Call::CreateRoom { max_players: 4 },
                Call::LoadLevel(SceneTarget::FIRST_SEED),
            ]
        );
        assert_eq!(c.state(), SessionState::InRoom);
    }

    #[test]
    fn test_prepare_applies_auto_sync_setting() {
        let c = SessionCoordinator::new(SessionConfig {
            auto_sync_scene: false,
            ..SessionConfig::default()
        });
        let mut net = FakeNetwork::default();

        c.prepare(&mut net);

        assert_eq!(net.calls, vec![Call::SetAutoSync(false)]);
    }
}
