use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::header::{Header, Layout, HEADER_SIZE};

/// A complete, CRC-validated frame.
///
/// `data` holds everything after the header: the declared payload plus, when
/// the payload is non-empty, the trailing end-magic byte. Trailer presence is
/// the payload decoder's concern — a corrupt trailer does not invalidate the
/// frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: Header,
    pub data: Bytes,
}

/// Outcome of feeding one byte to the assembler.
#[derive(Debug)]
pub enum Step {
    /// The byte is not part of a frame; the caller should treat it as raw
    /// console text.
    NotFrame,
    /// The byte was consumed; the frame is not complete yet.
    Pending,
    /// The byte was consumed and completed a frame.
    Complete(Frame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Header,
    Payload(Header),
}

/// Byte-at-a-time frame recognizer.
///
/// Sits between an unstructured byte stream and the payload decoder: bytes
/// outside a frame are rejected (raw text), a start magic opens a frame, a
/// header with a bad CRC silently drops it. Holds at most one in-flight
/// frame; completed frames are handed back in stream order.
#[derive(Debug)]
pub struct Assembler {
    layout: Layout,
    state: State,
    buf: BytesMut,
    expect: usize,
}

impl Assembler {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            state: State::Idle,
            buf: BytesMut::new(),
            expect: 0,
        }
    }

    /// Wire layout this assembler recognizes.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Feed one received byte.
    pub fn push(&mut self, byte: u8) -> Step {
        match self.state {
            State::Idle => {
                if byte != self.layout.magic() {
                    return Step::NotFrame;
                }
                self.buf.clear();
                self.buf.extend_from_slice(&[byte]);
                self.state = State::Header;
                self.expect = HEADER_SIZE;
                Step::Pending
            }
            State::Header => {
                self.buf.extend_from_slice(&[byte]);
                if self.buf.len() < self.expect {
                    return Step::Pending;
                }

                let header = match Header::parse(self.layout, &self.buf) {
                    Ok(header) => header,
                    Err(err) => {
                        // Stream noise; drop the partial frame and resync.
                        debug!(%err, "discarding frame with invalid header");
                        self.reset();
                        return Step::Pending;
                    }
                };

                if header.data_len == 0 {
                    self.reset();
                    trace!(?header, "frame complete (header only)");
                    return Step::Complete(Frame {
                        header,
                        data: Bytes::new(),
                    });
                }

                // Payload plus one byte for the end magic.
                self.expect = HEADER_SIZE + header.data_len + 1;
                self.state = State::Payload(header);
                Step::Pending
            }
            State::Payload(header) => {
                self.buf.extend_from_slice(&[byte]);
                if self.buf.len() < self.expect {
                    return Step::Pending;
                }

                let mut data = self.buf.split().freeze();
                self.reset();
                let data = data.split_off(HEADER_SIZE);
                trace!(?header, len = data.len(), "frame complete");
                Step::Complete(Frame { header, data })
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buf.clear();
        self.expect = 0;
    }
}
