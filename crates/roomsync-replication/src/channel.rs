//! Per-entity replication: owner captures, mirrors apply.

use roomsync_protocol::{PeerId, TickPayload, ViewId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ReplicationError, SyncReader, SyncWriter};

// ---------------------------------------------------------------------------
// Observable
// ---------------------------------------------------------------------------

/// State that can be written into, and read back out of, a tick.
///
/// `read_state` must consume values in exactly the order and kinds that
/// `write_state` produced them. There is no schema on the wire.
pub trait Observable {
    fn write_state(&self, writer: &mut SyncWriter);

    fn read_state(&mut self, reader: &mut SyncReader<'_>) -> Result<(), ReplicationError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Whether ticks carry a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Bare state values. Every tick is applied; the last one wins.
    #[default]
    Unsequenced,
    /// A `u32` sequence number precedes the state. Ticks older than the
    /// last applied one are dropped.
    Sequenced,
}

/// Replication settings shared by every channel a client creates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    pub mode: SyncMode,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One networked entity's replicated state.
///
/// The owning peer is fixed for the channel's lifetime. On the owner,
/// [`capture`](Self::capture) produces a tick every sync interval; on
/// every other peer, [`apply`](Self::apply) overwrites the mirror with
/// whatever the owner sent.
#[derive(Debug)]
pub struct ReplicationChannel<T> {
    view: ViewId,
    owner: PeerId,
    local: PeerId,
    mode: SyncMode,
    next_seq: u32,
    last_applied: Option<u32>,
    state: T,
}

impl<T: Observable + Clone> ReplicationChannel<T> {
    pub fn new(view: ViewId, owner: PeerId, local: PeerId, mode: SyncMode, state: T) -> Self {
        Self {
            view,
            owner,
            local,
            mode,
            next_seq: 0,
            last_applied: None,
            state,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn owner(&self) -> PeerId {
        self.owner
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// True on the owning peer.
    pub fn is_mine(&self) -> bool {
        self.owner == self.local
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    /// Mutable access for owner-side simulation.
    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// Writes the current state into a tick. Owner only.
    ///
    /// # Errors
    /// [`ReplicationError::NotOwner`] on a mirror.
    pub fn capture(&mut self) -> Result<TickPayload, ReplicationError> {
        if !self.is_mine() {
            return Err(ReplicationError::NotOwner(self.view));
        }
        let mut writer = SyncWriter::new();
        if self.mode == SyncMode::Sequenced {
            writer.send_next(self.next_seq);
            self.next_seq = self.next_seq.wrapping_add(1);
        }
        self.state.write_state(&mut writer);
        Ok(writer.into_payload())
    }

    /// Applies a tick from `sender` to the mirror.
    ///
    /// Returns `Ok(false)` when the tick is dropped: it came from a peer
    /// other than the owner, the entity is locally owned, or (in sequenced
    /// mode) it is older than the last applied tick. A malformed tick is an
    /// error and leaves the mirror untouched.
    pub fn apply(&mut self, sender: PeerId, payload: &TickPayload) -> Result<bool, ReplicationError> {
        if self.is_mine() {
            warn!(view = %self.view, %sender, "tick for locally owned entity dropped");
            return Ok(false);
        }
        if sender != self.owner {
            warn!(view = %self.view, %sender, owner = %self.owner, "tick from non-owner dropped");
            return Ok(false);
        }

        let mut reader = SyncReader::new(payload);
        let seq = match self.mode {
            SyncMode::Unsequenced => None,
            SyncMode::Sequenced => {
                let seq: u32 = reader.receive_next()?;
                if self.last_applied.is_some_and(|last| !is_newer(seq, last)) {
                    debug!(view = %self.view, seq, "stale tick dropped");
                    return Ok(false);
                }
                Some(seq)
            }
        };

        let mut next = self.state.clone();
        next.read_state(&mut reader)?;
        reader.finish()?;

        self.state = next;
        if seq.is_some() {
            self.last_applied = seq;
        }
        Ok(true)
    }
}

/// Serial-number comparison that survives `u32` wrap-around.
fn is_newer(seq: u32, last: u32) -> bool {
    (seq.wrapping_sub(last) as i32) > 0
}

// =========================================================================
// Tests
// =========================================================================
