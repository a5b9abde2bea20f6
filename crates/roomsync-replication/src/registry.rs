//! Every avatar in the current room, keyed by view id.
//!
//! View ids come in blocks of [`VIEW_ID_BLOCK`] per peer, so the owner of
//! any view can be read off its id without asking the network.

use std::collections::BTreeMap;

use roomsync_protocol::{PeerId, TickPayload, ViewId};
use tracing::{debug, info, warn};

use crate::{PlayerAvatar, ReplicationError};

/// View ids are handed out in blocks of this size per peer, so the owner of
/// any view can be read off its id.
pub const VIEW_ID_BLOCK: u32 = 1000;

/// The peer whose block `view` falls in.
pub fn view_owner(view: ViewId) -> PeerId {
    PeerId(view.0 / VIEW_ID_BLOCK)
}

/// All avatars that exist in the current room, keyed by view id.
///
/// Iteration is in view-id order, so the owned ticks produced by
/// [`capture_owned`](Self::capture_owned) come out in a stable order.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    avatars: BTreeMap<ViewId, PlayerAvatar>,
    next_index: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next free view id in `owner`'s block.
    ///
    /// Returns `None` once the block is used up.
    pub fn allocate_view(&mut self, owner: PeerId) -> Option<ViewId> {
        loop {
            self.next_index += 1;
            if self.next_index >= VIEW_ID_BLOCK {
                return None;
            }
            let view = ViewId(owner.0.checked_mul(VIEW_ID_BLOCK)?.checked_add(self.next_index)?);
            if !self.avatars.contains_key(&view) {
                return Some(view);
            }
        }
    }

    /// Registers a spawned avatar.
    ///
    /// # Errors
    /// [`ReplicationError::DuplicateView`] if the view id is taken; the
    /// existing avatar is kept.
    pub fn insert(&mut self, avatar: PlayerAvatar) -> Result<(), ReplicationError> {
        let view = avatar.view();
        if self.avatars.contains_key(&view) {
            return Err(ReplicationError::DuplicateView(view));
        }
        self.avatars.insert(view, avatar);
        Ok(())
    }

    pub fn remove(&mut self, view: ViewId) -> Option<PlayerAvatar> {
        self.avatars.remove(&view)
    }

    /// Removes every avatar owned by `peer`. Returns how many went.
    pub fn remove_owned_by(&mut self, peer: PeerId) -> usize {
        let before = self.avatars.len();
        self.avatars.retain(|_, avatar| avatar.owner() != peer);
        let removed = before - self.avatars.len();
        if removed > 0 {
            debug!(%peer, removed, "avatars despawned");
        }
        removed
    }

    /// Drops every avatar, e.g. when leaving a room.
    pub fn clear(&mut self) {
        if !self.avatars.is_empty() {
            info!(count = self.avatars.len(), "clearing all avatars");
        }
        self.avatars.clear();
        self.next_index = 0;
    }

    pub fn get(&self, view: ViewId) -> Option<&PlayerAvatar> {
        self.avatars.get(&view)
    }

    pub fn get_mut(&mut self, view: ViewId) -> Option<&mut PlayerAvatar> {
        self.avatars.get_mut(&view)
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerAvatar> {
        self.avatars.values()
    }

    /// Ticks for every locally owned avatar.
    pub fn capture_owned(&mut self) -> Vec<(ViewId, TickPayload)> {
        let mut ticks = Vec::new();
        for (view, avatar) in self.avatars.iter_mut().filter(|(_, a)| a.is_mine()) {
            match avatar.capture_tick() {
                Ok(payload) => ticks.push((*view, payload)),
                Err(e) => warn!(%view, error = %e, "capture failed"),
            }
        }
        ticks
    }

    /// Routes an incoming tick to its avatar.
    ///
    /// A tick for a view that isn't registered (not spawned yet, or already
    /// gone) is dropped and reported as `Ok(false)`.
    pub fn apply(&mut self, view: ViewId, sender: PeerId, payload: &TickPayload) -> Result<bool, ReplicationError> {
        match self.avatars.get_mut(&view) {
            Some(avatar) => avatar.apply_tick(sender, payload),
            None => {
                debug!(%view, %sender, "tick for unknown view dropped");
                Ok(false)
            }
        }
    }

    /// Runs the per-frame visual sync on every avatar.
    pub fn update(&mut self) {
        for avatar in self.avatars.values_mut() {
            avatar.update();
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
