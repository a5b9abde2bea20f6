//! Error types for the protocol layer.

/// Errors raised while building or decoding protocol values.
///
/// A `ProtocolError` always means the *shape* of some data was wrong:
/// bytes that don't parse, a value of the wrong kind in a tick payload,
/// or room options outside their legal range. Connection and session
/// problems live in their own crates.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a
    /// truncated buffer.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A sync value was read as the wrong kind.
    ///
    /// Tick payloads carry no schema, so the reader must ask for values in
    /// exactly the order and kinds the writer produced them.
    #[error("sync value type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// `max_players` must be at least 1.
    #[error("invalid max players: {0} (must be 1..=255)")]
    InvalidMaxPlayers(u8),
}
