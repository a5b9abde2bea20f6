//! The nickname field: restored from preferences at startup, applied to
//! the network service and saved again on every confirmed change.

use roomsync_network::NetworkService;

use crate::{PLAYER_NAME_KEY, PreferenceStore, SessionError};

/// The launcher's nickname input.
///
/// Reads the last confirmed name once at startup and applies it to the
/// network service; afterwards every confirmed name is applied and
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct NicknameField {
    text: String,
}

impl NicknameField {
    /// Restores the saved nickname (empty if none) and applies it.
    pub fn load<P, N>(prefs: &P, net: &mut N) -> Self
    where
        P: PreferenceStore,
        N: NetworkService,
    {
        let text = prefs.get_string(PLAYER_NAME_KEY).unwrap_or_default();
        net.set_nickname(&text);
        tracing::debug!(nickname = %text, "nickname restored");
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Confirms a new nickname.
    ///
    /// # Errors
    /// [`SessionError::EmptyNickname`] for an empty value (nothing is
    /// applied or saved), or a preferences error if saving fails.
    pub fn submit<P, N>(&mut self, value: &str, prefs: &mut P, net: &mut N) -> Result<(), SessionError>
    where
        P: PreferenceStore,
        N: NetworkService,
    {
        if value.is_empty() {
            tracing::error!("player name is empty");
            return Err(SessionError::EmptyNickname);
        }
        net.set_nickname(value);
        prefs.set_string(PLAYER_NAME_KEY, value)?;
        self.text = value.to_string();
        Ok(())
    }
}
