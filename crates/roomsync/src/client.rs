//! `GameClient`: one player's context, wiring session, membership and
//! replication to a network service.

use roomsync_network::{NetworkEvent, NetworkService};
use roomsync_protocol::{PeerId, SceneTarget, TickPayload, ViewId};
use roomsync_replication::{
    BeamVisual, CameraFollow, EntityRegistry, PlayerAvatar, SyncMode, view_owner,
};
use roomsync_session::{
    Affordance, MembershipHandler, NicknameField, PreferenceStore, SceneLoader,
    SessionCoordinator, SessionError, SessionState,
};
use roomsync_tick::TickScheduler;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::{ClientConfig, ClientError};

/// Builds the beam visual for a mirror avatar spawned from the network.
pub type BeamFactory = Box<dyn FnMut(ViewId) -> Option<Box<dyn BeamVisual>> + Send>;

/// A single client.
///
/// Owns everything one player needs: the network service, a local scene
/// loader, the preference store, the session coordinator, the membership
/// handler and every avatar in the current room. Nothing is global; pass
/// the client to whatever needs it.
///
/// Drive it either by calling [`sync_tick`](Self::sync_tick) from your own
/// loop, or with [`run`](Self::run).
pub struct GameClient<N, S, P> {
    net: N,
    scenes: S,
    prefs: P,
    coordinator: SessionCoordinator,
    membership: MembershipHandler,
    nickname: NicknameField,
    registry: EntityRegistry,
    scheduler: TickScheduler,
    sync_mode: SyncMode,
    beam_factory: Option<BeamFactory>,
}

impl<N, S, P> GameClient<N, S, P>
where
    N: NetworkService,
    S: SceneLoader,
    P: PreferenceStore,
{
    /// Sets up the client: scene auto-sync on the service, the saved
    /// nickname applied, sync tick paused until a room is joined.
    pub fn new(config: ClientConfig, mut net: N, scenes: S, prefs: P) -> Self {
        let config = config.validated();
        let coordinator = SessionCoordinator::new(config.session);
        coordinator.prepare(&mut net);
        let nickname = NicknameField::load(&prefs, &mut net);

        let mut scheduler = TickScheduler::new(config.tick);
        scheduler.pause();

        info!(
            peer = ?net.local_peer(),
            nickname = %nickname.text(),
            sync_mode = ?config.replication.mode,
            "game client ready"
        );

        Self {
            net,
            scenes,
            prefs,
            coordinator,
            membership: MembershipHandler::new(),
            nickname,
            registry: EntityRegistry::new(),
            scheduler,
            sync_mode: config.replication.mode,
            beam_factory: None,
        }
    }

    /// Gives mirror avatars a beam visual when they appear.
    pub fn set_beam_factory(&mut self, factory: BeamFactory) {
        self.beam_factory = Some(factory);
    }

    // =====================================================================
    // User actions
    // =====================================================================

    /// The launcher's play button.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        Ok(self.coordinator.request_connect(&mut self.net)?)
    }

    /// The in-room leave button.
    pub fn leave_room(&mut self) -> Result<(), ClientError> {
        Ok(self.coordinator.request_leave_room(&mut self.net)?)
    }

    /// Drops the connection. Completion arrives as `Disconnected`.
    pub fn disconnect(&mut self) -> Result<(), ClientError> {
        Ok(self.net.disconnect()?)
    }

    /// Confirms a new nickname: applied to the service and persisted.
    pub fn set_player_name(&mut self, name: &str) -> Result<(), ClientError> {
        Ok(self.nickname.submit(name, &mut self.prefs, &mut self.net)?)
    }

    /// Reloads the arena for the current player count on every peer.
    ///
    /// # Errors
    /// [`SessionError::NotAuthority`] (wrapped) unless this peer is master.
    pub fn load_arena(&mut self) -> Result<SceneTarget, ClientError> {
        Ok(self.membership.load_arena(&mut self.net)?)
    }

    /// Spawns this peer's avatar in the current room.
    pub fn spawn_avatar(
        &mut self,
        beams: Option<Box<dyn BeamVisual>>,
        camera: Option<Box<dyn CameraFollow>>,
    ) -> Result<ViewId, ClientError> {
        if !self.is_in_room() {
            return Err(SessionError::NotInRoom.into());
        }
        let local = self.local_peer()?;
        let view = self
            .registry
            .allocate_view(local)
            .ok_or(ClientError::ViewIdsExhausted)?;
        self.registry
            .insert(PlayerAvatar::spawn(view, local, local, self.sync_mode, beams, camera))?;
        info!(%view, "local avatar spawned");
        Ok(view)
    }

    // =====================================================================
    // Loop
    // =====================================================================

    /// Handles every buffered network event, oldest first.
    ///
    /// Stops at the first event whose handling fails; later events stay
    /// queued for the next call. Returns how many events were handled.
    pub fn pump_events(&mut self) -> Result<usize, ClientError> {
        let result = self.drain_events();
        self.scheduler.set_active(self.is_in_room());
        result
    }

    /// One sync tick: drain events, refresh visuals, then send the state of
    /// every owned avatar. Returns how many ticks were sent.
    pub fn sync_tick(&mut self) -> Result<usize, ClientError> {
        self.pump_events()?;
        self.registry.update();
        if !self.is_in_room() {
            return Ok(0);
        }

        let ticks = self.registry.capture_owned();
        let sent = ticks.len();
        for (view, payload) in ticks {
            self.net.send_tick(view, payload)?;
        }
        trace!(sent, "sync tick sent");
        Ok(sent)
    }

    /// Runs the client until `shutdown` flips to `true` or its sender is
    /// dropped.
    ///
    /// In a room, sync ticks fire at the configured rate. Outside one, the
    /// event queue is still polled at that rate so connect and join
    /// callbacks get handled. Errors are logged and the loop carries on.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut idle_poll = time::interval(self.scheduler.interval());
        idle_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(rate_hz = self.scheduler.rate_hz(), "client loop started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = self.scheduler.wait_for_tick() => {
                    if let Err(e) = self.sync_tick() {
                        warn!(error = %e, "sync tick failed");
                    }
                }
                _ = idle_poll.tick(), if self.scheduler.is_paused() => {
                    if let Err(e) = self.pump_events() {
                        warn!(error = %e, "event handling failed");
                    }
                }
            }
        }

        info!(ticks = self.scheduler.tick_count(), "client loop stopped");
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn state(&self) -> SessionState {
        self.coordinator.state()
    }

    pub fn affordance(&self) -> Affordance {
        self.coordinator.affordance()
    }

    pub fn is_in_room(&self) -> bool {
        self.coordinator.state() == SessionState::InRoom
    }

    pub fn nickname(&self) -> &str {
        self.nickname.text()
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn net(&self) -> &N {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut N {
        &mut self.net
    }

    pub fn scenes(&self) -> &S {
        &self.scenes
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn avatar(&self, view: ViewId) -> Option<&PlayerAvatar> {
        self.registry.get(view)
    }

    /// For feeding input and contacts to the local avatar.
    pub fn avatar_mut(&mut self, view: ViewId) -> Option<&mut PlayerAvatar> {
        self.registry.get_mut(view)
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    // =====================================================================
    // Event dispatch
    // =====================================================================

    fn drain_events(&mut self) -> Result<usize, ClientError> {
        let mut handled = 0;
        while let Some(event) = self.net.poll_event() {
            self.dispatch(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    fn dispatch(&mut self, event: NetworkEvent) -> Result<(), ClientError> {
        trace!(event = event.name(), "network event");
        match &event {
            NetworkEvent::Tick { view, sender, payload } => {
                self.apply_tick(*view, *sender, payload);
                return Ok(());
            }
            NetworkEvent::SceneChanged(target) => self.scenes.load_scene(target),
            NetworkEvent::PlayerLeft(peer) => {
                self.registry.remove_owned_by(peer.id);
            }
            NetworkEvent::LeftRoom | NetworkEvent::Disconnected(_) => self.registry.clear(),
            _ => {}
        }

        self.coordinator
            .handle_event(&event, &mut self.net, &mut self.scenes)?;
        self.membership.handle_event(&event, &mut self.net)?;
        Ok(())
    }

    /// Replication desync is tolerated: bad ticks are logged and dropped.
    fn apply_tick(&mut self, view: ViewId, sender: PeerId, payload: &TickPayload) {
        if self.registry.get(view).is_none() {
            self.spawn_mirror(view, sender);
        }
        match self.registry.apply(view, sender, payload) {
            Ok(true) => trace!(%view, %sender, "tick applied"),
            Ok(false) => {}
            Err(e) => warn!(%view, %sender, error = %e, "malformed tick dropped"),
        }
    }

    /// First tick for an unknown view: spawn a mirror for its owner.
    fn spawn_mirror(&mut self, view: ViewId, sender: PeerId) {
        let Some(local) = self.net.local_peer() else {
            return;
        };
        if sender == local || view_owner(view) != sender {
            warn!(%view, %sender, "tick for a view the sender can't own");
            return;
        }
        let beams = self.beam_factory.as_mut().and_then(|make| make(view));
        let mirror = PlayerAvatar::spawn(view, sender, local, self.sync_mode, beams, None);
        match self.registry.insert(mirror) {
            Ok(()) => debug!(%view, owner = %sender, "mirror avatar spawned"),
            Err(e) => warn!(%view, error = %e, "mirror spawn failed"),
        }
    }

    fn local_peer(&self) -> Result<PeerId, ClientError> {
        self.net
            .local_peer()
            .ok_or(ClientError::Network(roomsync_network::NetworkError::NotConnected))
    }
}
