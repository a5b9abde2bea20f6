//! The player avatar: firing flag and health, replicated owner → mirrors.

use roomsync_protocol::{PeerId, TickPayload, ViewId};
use tracing::{debug, error};

use crate::{Observable, ReplicationChannel, ReplicationError, SyncMode, SyncReader, SyncWriter};

/// Health lost on the first frame of a beam contact.
pub const BEAM_HIT_DAMAGE: f32 = 0.1;
/// Health lost per second while a beam contact persists.
pub const BEAM_DAMAGE_PER_SECOND: f32 = 0.1;
/// Colliders whose name contains this deal damage.
pub const BEAM_COLLIDER_TAG: &str = "Beam";

// ---------------------------------------------------------------------------
// Replicated state
// ---------------------------------------------------------------------------

/// What one avatar replicates each tick, in wire order.
///
/// Health starts at 1.0 and is never clamped; it can go negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub is_firing: bool,
    pub health: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            is_firing: false,
            health: 1.0,
        }
    }
}

impl Observable for PlayerState {
    fn write_state(&self, writer: &mut SyncWriter) {
        writer.send_next(self.is_firing);
        writer.send_next(self.health);
    }

    fn read_state(&mut self, reader: &mut SyncReader<'_>) -> Result<(), ReplicationError> {
        self.is_firing = reader.receive_next()?;
        self.health = reader.receive_next()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The beam effect attached to an avatar.
pub trait BeamVisual: Send {
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

/// A camera rig that can track the local avatar.
pub trait CameraFollow: Send {
    fn start_following(&mut self);
}

/// Fire button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireInput {
    Down,
    Up,
}

// ---------------------------------------------------------------------------
// Avatar
// ---------------------------------------------------------------------------

/// A spawned player avatar, either owned locally or mirroring a remote peer.
///
/// Only the owner reacts to input and beam contacts. Mirrors take every
/// change from [`apply_tick`](Self::apply_tick).
pub struct PlayerAvatar {
    channel: ReplicationChannel<PlayerState>,
    beams: Option<Box<dyn BeamVisual>>,
    camera: Option<Box<dyn CameraFollow>>,
}

impl PlayerAvatar {
    /// Spawns an avatar.
    ///
    /// The beam visual starts hidden; a missing one is logged here and then
    /// ignored. An owned avatar starts its camera following it, and logs if
    /// it has none. Mirrors never touch the camera.
    pub fn spawn(
        view: ViewId,
        owner: PeerId,
        local: PeerId,
        mode: SyncMode,
        mut beams: Option<Box<dyn BeamVisual>>,
        mut camera: Option<Box<dyn CameraFollow>>,
    ) -> Self {
        let channel = ReplicationChannel::new(view, owner, local, mode, PlayerState::default());

        match beams.as_mut() {
            Some(beams) => beams.set_active(false),
            None => error!(%view, "missing beam visual on player avatar"),
        }
        if channel.is_mine() {
            match camera.as_mut() {
                Some(camera) => camera.start_following(),
                None => error!(%view, "missing camera follow on local player avatar"),
            }
        }

        debug!(%view, %owner, is_mine = channel.is_mine(), "player avatar spawned");
        Self {
            channel,
            beams,
            camera,
        }
    }

    pub fn view(&self) -> ViewId {
        self.channel.view()
    }

    pub fn owner(&self) -> PeerId {
        self.channel.owner()
    }

    pub fn is_mine(&self) -> bool {
        self.channel.is_mine()
    }

    pub fn state(&self) -> PlayerState {
        *self.channel.state()
    }

    pub fn health(&self) -> f32 {
        self.channel.state().health
    }

    pub fn is_firing(&self) -> bool {
        self.channel.state().is_firing
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Fire button handling. Ignored on mirrors.
    pub fn process_input(&mut self, input: FireInput) {
        if !self.is_mine() {
            return;
        }
        let firing = input == FireInput::Down;
        let state = self.channel.state_mut();
        if state.is_firing != firing {
            state.is_firing = firing;
            debug!(view = %self.channel.view(), firing, "fire input");
        }
    }

    /// Another collider started touching this avatar.
    pub fn contact_begin(&mut self, other_name: &str) {
        if self.is_mine() && other_name.contains(BEAM_COLLIDER_TAG) {
            self.channel.state_mut().health -= BEAM_HIT_DAMAGE;
        }
    }

    /// A collider is still touching this avatar after `dt` seconds.
    pub fn contact_stay(&mut self, other_name: &str, dt: f32) {
        if self.is_mine() && other_name.contains(BEAM_COLLIDER_TAG) {
            self.channel.state_mut().health -= BEAM_DAMAGE_PER_SECOND * dt;
        }
    }

    /// Per-frame visual sync: the beam effect follows `is_firing`.
    pub fn update(&mut self) {
        let firing = self.is_firing();
        if let Some(beams) = self.beams.as_mut() {
            if beams.is_active() != firing {
                beams.set_active(firing);
            }
        }
    }

    /// Owner side of a sync tick.
    pub fn capture_tick(&mut self) -> Result<TickPayload, ReplicationError> {
        self.channel.capture()
    }

    /// Mirror side of a sync tick.
    pub fn apply_tick(&mut self, sender: PeerId, payload: &TickPayload) -> Result<bool, ReplicationError> {
        self.channel.apply(sender, payload)
    }
}

impl std::fmt::Debug for PlayerAvatar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerAvatar")
            .field("channel", &self.channel)
            .field("has_beams", &self.beams.is_some())
            .field("has_camera", &self.camera.is_some())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
