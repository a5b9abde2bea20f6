//! Shared vocabulary for roomsync.
//!
//! Every other crate in the workspace talks in these types:
//!
//! - **Identity** ([`PeerId`], [`RoomName`], [`ViewId`], [`GameVersion`]):
//!   who is talking, where, and about which networked entity.
//! - **Scene targets** ([`SceneTarget`]): what a level load points at.
//! - **Room options** ([`RoomOptions`]): the parameters sent with a
//!   create-room request.
//! - **Sync values** ([`SyncValue`], [`TickPayload`]): the ordered values
//!   that make up one replication tick.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, values out.
//!
//! ```text
//! NetworkService (bytes, events) → Protocol (TickPayload) → Replication (entity state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    DisconnectCause, GameVersion, PeerId, RoomName, RoomOptions, SceneTarget,
    SyncValue, TickPayload, ViewId,
};
