//! Session lifecycle for roomsync clients.
//!
//! This crate owns the part of the client that decides *what to ask the
//! network for next*:
//!
//! 1. **Lifecycle**: [`SessionCoordinator`] drives connect →
//!    join-random-or-create → in-room → leave.
//! 2. **Membership & authority**: [`MembershipHandler`] reloads the arena
//!    when peers come and go, but only if this peer holds authority.
//! 3. **Local collaborators**: [`SceneLoader`] for local scene loads and
//!    [`PreferenceStore`] / [`NicknameField`] for the persisted nickname.
//!
//! # How it fits in the stack
//!
//! ```text
//! GameClient (above)  ← drains NetworkEvents, routes them here
//!     ↕
//! Session layer (this crate)  ← state machine + authority guard
//!     ↕
//! NetworkService (below)  ← fire-and-forget requests, events back
//! ```

mod coordinator;
mod error;
mod membership;
mod nickname;
mod prefs;
mod scene;
mod session;

#[cfg(test)]
mod testing;

pub use coordinator::SessionCoordinator;
pub use error::{PreferencesError, SessionError};
pub use membership::MembershipHandler;
pub use nickname::NicknameField;
pub use prefs::{JsonFilePreferences, MemoryPreferences, PLAYER_NAME_KEY, PreferenceStore};
pub use scene::{SceneLoader, SceneLog};
pub use session::{Affordance, SessionConfig, SessionState};
