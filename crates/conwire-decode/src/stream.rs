use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::engine::Decoder;
use crate::error::Result;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// One piece of console output in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Raw console text that was not part of any frame.
    Text(String),
    /// Decoded text of one complete packet.
    Packet(String),
    /// Diagnostic annotation (dropped, missing, or corrupt packets).
    Notice(String),
}

/// Reads a console byte stream and separates raw text from decoded packets.
///
/// Handles partial reads internally — callers always get complete output
/// items. Raw text is batched into runs and always emitted before the
/// packet that interrupted it, preserving console order.
pub struct DecodeReader<T> {
    inner: T,
    decoder: Decoder,
    pending: VecDeque<Output>,
    raw: Vec<u8>,
}

impl<T: Read> DecodeReader<T> {
    pub fn new(inner: T, decoder: Decoder) -> Self {
        Self {
            inner,
            decoder,
            pending: VecDeque::new(),
            raw: Vec::new(),
        }
    }

    /// Read the next output item (blocking).
    ///
    /// Returns `Ok(None)` at end of stream, after flushing any buffered
    /// raw text.
    pub fn next_output(&mut self) -> Result<Option<Output>> {
        loop {
            if let Some(out) = self.pending.pop_front() {
                return Ok(Some(out));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if read == 0 {
                self.flush_raw();
                return Ok(self.pending.pop_front());
            }

            for &byte in &chunk[..read] {
                if !self.decoder.feed(byte) {
                    self.raw.push(byte);
                    continue;
                }
                let decoded = self.decoder.take_decoded();
                let notices = self.decoder.take_errors();
                if decoded.is_empty() && notices.is_empty() {
                    continue;
                }
                self.flush_raw();
                for notice in notices {
                    self.pending.push_back(Output::Notice(notice));
                }
                if !decoded.is_empty() {
                    self.pending.push_back(Output::Packet(decoded));
                }
            }
        }
    }

    fn flush_raw(&mut self) {
        if self.raw.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.raw).into_owned();
        self.raw.clear();
        self.pending.push_back(Output::Text(text));
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
