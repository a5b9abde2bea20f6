//! Local scene loading.

use roomsync_protocol::SceneTarget;

/// Loads a scene locally, without telling anyone else.
///
/// Network-wide loads go through `NetworkService::load_level`; this is for
/// the cases where only this client changes scene (back to the entry
/// scene after leaving a room, or following a synced scene change).
pub trait SceneLoader {
    fn load_scene(&mut self, target: &SceneTarget);
}

/// A [`SceneLoader`] that only remembers what it was asked to load.
///
/// Used by headless clients and tests.
#[derive(Debug, Clone, Default)]
pub struct SceneLog {
    loads: Vec<SceneTarget>,
}

impl SceneLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load, oldest first.
    pub fn loads(&self) -> &[SceneTarget] {
        &self.loads
    }

    /// The most recently loaded scene.
    pub fn current(&self) -> Option<&SceneTarget> {
        self.loads.last()
    }
}

impl SceneLoader for SceneLog {
    fn load_scene(&mut self, target: &SceneTarget) {
        tracing::debug!(%target, "scene loaded");
        self.loads.push(target.clone());
    }
}
