use bytes::Bytes;

use crate::error::{DecodeError, Result};

/// Forward-only cursor over a frame's payload bytes.
///
/// Every read is bounds-checked; overruns surface as
/// [`DecodeError::ShortPayload`] so a corrupt length field aborts one
/// frame's decode instead of panicking.
#[derive(Debug)]
pub struct PayloadCursor {
    data: Bytes,
}

impl PayloadCursor {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Consume the next `count` bytes.
    pub fn take(&mut self, count: usize) -> Result<Bytes> {
        if self.data.len() < count {
            return Err(DecodeError::ShortPayload {
                wanted: count,
                remaining: self.data.len(),
            });
        }
        Ok(self.data.split_to(count))
    }

    /// Consume the next byte.
    pub fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Consume a little-endian u32 parameter word.
    pub fn take_u32_le(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
