//! Ordered, schema-less value streams for one tick.

use roomsync_protocol::{ProtocolError, SyncValue, TickPayload};

use crate::ReplicationError;

/// Appends values to an outgoing tick in call order.
#[derive(Debug, Default)]
pub struct SyncWriter {
    values: Vec<SyncValue>,
}

impl SyncWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_next(&mut self, value: impl Into<SyncValue>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_payload(self) -> TickPayload {
        TickPayload(self.values)
    }
}

/// Reads values back out of an incoming tick, front to back.
#[derive(Debug)]
pub struct SyncReader<'a> {
    values: &'a [SyncValue],
    read: usize,
}

impl<'a> SyncReader<'a> {
    pub fn new(payload: &'a TickPayload) -> Self {
        Self {
            values: &payload.0,
            read: 0,
        }
    }

    /// Takes the next value as `T`.
    ///
    /// # Errors
    /// [`ReplicationError::Exhausted`] past the end of the tick, or a
    /// protocol type mismatch if the next value is of another kind.
    pub fn receive_next<T>(&mut self) -> Result<T, ReplicationError>
    where
        T: TryFrom<SyncValue, Error = ProtocolError>,
    {
        let value = self
            .values
            .get(self.read)
            .cloned()
            .ok_or(ReplicationError::Exhausted { read: self.read })?;
        self.read += 1;
        Ok(T::try_from(value)?)
    }

    pub fn remaining(&self) -> usize {
        self.values.len() - self.read
    }

    /// Checks that every value was consumed.
    pub fn finish(self) -> Result<(), ReplicationError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(ReplicationError::TrailingValues { remaining }),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
