//! Wire framing for embedded console log packets.
//!
//! The target firmware interleaves raw console text with checksummed binary
//! packets. Each packet is framed with:
//! - A 1-byte start magic (`0xC0` base layout, `0xC2` extended layout)
//! - A fixed 13-byte header carrying sequence, channel, timestamp and length
//! - A CRC-8 over the header
//! - An optional payload terminated by a 1-byte end magic (`0xC1`)
//!
//! This crate recognizes and validates frames one byte at a time; it never
//! interprets payload contents.

pub mod assembler;
pub mod channel;
pub mod crc;
pub mod error;
pub mod header;

pub use assembler::{Assembler, Frame, Step};
pub use channel::channel_tag;
pub use crc::crc8;
pub use error::{FrameError, Result};
pub use header::{Header, HeaderDetail, Layout, END_MAGIC, HEADER_SIZE};
