//! Codec trait and implementations for tick payloads and other wire values.
//!
//! The relay never interprets what an entity sends; it moves bytes. The
//! codec is the single place that decides how a [`TickPayload`] (or any
//! other serde type) becomes those bytes. Swapping JSON for a binary
//! format means adding a new [`Codec`] impl, nothing else.
//!
//! [`TickPayload`]: crate::TickPayload

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so a codec can sit inside a shared relay hub
/// or a long-lived client without borrowing anything.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Readable in logs, which matters more than size while the relay is an
/// in-process loopback. Behind the `json` feature (on by default).
///
/// ```rust
/// use roomsync_protocol::{Codec, JsonCodec, SyncValue, TickPayload};
///
/// let codec = JsonCodec;
/// let tick = TickPayload(vec![SyncValue::Bool(true), SyncValue::Float(0.9)]);
///
/// let bytes = codec.encode(&tick).unwrap();
/// let decoded: TickPayload = codec.decode(&bytes).unwrap();
/// assert_eq!(tick, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
