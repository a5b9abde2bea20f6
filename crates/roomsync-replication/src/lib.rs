//! State replication for roomsync networked entities.
//!
//! Each networked entity has exactly one owner. Once per sync tick the
//! owner writes the entity's state as an ordered list of values; every
//! other peer reads them back in the same order and overwrites its mirror.
//!
//! - [`SyncWriter`] / [`SyncReader`]: ordered value streams for one tick
//! - [`Observable`]: state that knows its own wire order
//! - [`ReplicationChannel`]: owner/mirror rules for one entity
//! - [`PlayerAvatar`]: the replicated player: firing flag and health
//! - [`EntityRegistry`]: every avatar in the current room
//!
//! ```text
//! owner:  PlayerState ─write_state→ SyncWriter → TickPayload ─send_tick→
//! mirror: ─Tick event→ TickPayload → SyncReader ─read_state→ PlayerState
//! ```

mod channel;
mod error;
mod player;
mod registry;
mod stream;

pub use channel::{Observable, ReplicationChannel, ReplicationConfig, SyncMode};
pub use error::ReplicationError;
pub use player::{
    BEAM_COLLIDER_TAG, BEAM_DAMAGE_PER_SECOND, BEAM_HIT_DAMAGE, BeamVisual, CameraFollow,
    FireInput, PlayerAvatar, PlayerState,
};
pub use registry::{EntityRegistry, VIEW_ID_BLOCK, view_owner};
pub use stream::{SyncReader, SyncWriter};
