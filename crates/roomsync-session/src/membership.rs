//! Membership & authority: reload the arena whenever the roster changes.
//!
//! Policy: the level is reset on *every* membership change, in either
//! direction, rather than patched for the newcomer or the leaver. Only the
//! peer holding authority issues the reload; everyone else receives it
//! through scene auto-sync.

use roomsync_network::{NetworkEvent, NetworkService, PeerInfo};
use roomsync_protocol::{PeerId, SceneTarget};

use crate::SessionError;

/// Reacts to peers entering and leaving the local peer's room.
///
/// Holds no state. Authority and occupancy are read from the network
/// service at the moment a reload is issued, so the scene chosen reflects
/// the roster *then*, not when the triggering event was queued.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipHandler;

impl MembershipHandler {
    pub fn new() -> Self {
        Self
    }

    /// Routes membership events; everything else is ignored.
    ///
    /// Returns the reload that was issued, if any.
    pub fn handle_event<N: NetworkService>(
        &self,
        event: &NetworkEvent,
        net: &mut N,
    ) -> Result<Option<SceneTarget>, SessionError> {
        match event {
            NetworkEvent::PlayerEntered(peer) => self.on_player_entered(peer, net),
            NetworkEvent::PlayerLeft(peer) => self.on_player_left(peer, net),
            NetworkEvent::MasterSwitched(master) => {
                self.on_master_switched(*master, net);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    pub fn on_player_entered<N: NetworkService>(
        &self,
        peer: &PeerInfo,
        net: &mut N,
    ) -> Result<Option<SceneTarget>, SessionError> {
        tracing::info!(peer = %peer.id, nickname = %peer.nickname, "player entered room");
        self.reload_if_master(net)
    }

    pub fn on_player_left<N: NetworkService>(
        &self,
        peer: &PeerInfo,
        net: &mut N,
    ) -> Result<Option<SceneTarget>, SessionError> {
        tracing::info!(peer = %peer.id, nickname = %peer.nickname, "player left room");
        self.reload_if_master(net)
    }

    pub fn on_master_switched<N: NetworkService>(&self, master: PeerId, net: &N) {
        let is_local = net.local_peer() == Some(master);
        tracing::info!(%master, is_local, "room authority switched");
    }

    /// Loads `"Room for {player_count}"` on every peer in the room.
    ///
    /// This is a privileged action.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthority`] if the local peer isn't master. The
    ///   load is **not** attempted.
    /// - [`SessionError::NotInRoom`] if there is no current room.
    pub fn load_arena<N: NetworkService>(&self, net: &mut N) -> Result<SceneTarget, SessionError> {
        if !net.is_master() {
            tracing::error!("refusing to load a level: not the master client");
            return Err(SessionError::NotAuthority);
        }
        let room = net.current_room().ok_or(SessionError::NotInRoom)?;
        let target = SceneTarget::for_player_count(room.player_count);
        tracing::info!(%target, player_count = room.player_count, "loading arena");
        net.load_level(&target)?;
        Ok(target)
    }

    fn reload_if_master<N: NetworkService>(&self, net: &mut N) -> Result<Option<SceneTarget>, SessionError> {
        if !net.is_master() {
            return Ok(None);
        }
        self.load_arena(net).map(Some)
    }
}
