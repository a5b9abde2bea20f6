//! # roomsync
//!
//! Client-side session and state sync for room-based multiplayer games.
//!
//! A [`GameClient`] connects to a relay network, joins a random room (or
//! creates one when none is available), keeps every peer on the same scene
//! as the roster changes, and replicates each player's avatar from its
//! owner to everyone else at a fixed sync rate.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use roomsync::prelude::*;
//!
//! let relay = LoopbackRelay::new();
//! let mut client = GameClient::new(
//!     ClientConfig::default(),
//!     relay.client(),
//!     SceneLog::new(),
//!     MemoryPreferences::new(),
//! );
//! client.connect()?;
//! client.pump_events()?;
//! assert!(client.is_in_room());
//! # Ok::<(), ClientError>(())
//! ```

mod client;
mod config;
mod error;
pub mod logging;

pub use client::{BeamFactory, GameClient};
pub use config::{ClientConfig, DynPreferences};
pub use error::ClientError;

pub use roomsync_network as network;
pub use roomsync_protocol as protocol;
pub use roomsync_replication as replication;
pub use roomsync_session as session;
pub use roomsync_tick as tick;

pub mod prelude {
    pub use crate::{ClientConfig, ClientError, DynPreferences, GameClient};
    pub use roomsync_network::{LoopbackRelay, LoopbackService, NetworkEvent, NetworkService};
    pub use roomsync_protocol::{PeerId, SceneTarget, ViewId};
    pub use roomsync_replication::{BeamVisual, CameraFollow, FireInput, PlayerAvatar, SyncMode};
    pub use roomsync_session::{
        JsonFilePreferences, MemoryPreferences, PreferenceStore, SceneLoader, SceneLog,
        SessionState,
    };
}
