use bytes::Buf;

use crate::crc::crc8;
use crate::error::{FrameError, Result};

/// Fixed header size shared by both layouts (start magic included).
pub const HEADER_SIZE: usize = 13;

/// End-of-payload magic, expected as the last payload byte when the
/// declared payload length is non-zero.
pub const END_MAGIC: u8 = 0xc1;

/// Wire layout of a packet header.
///
/// The set of layouts is fixed by the emitting firmware: `Base` packets
/// carry an inline literal string plus packed parameter words, `Extended`
/// packets carry an index into a build-time compiled string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Base,
    Extended,
}

impl Layout {
    /// Start-of-frame magic byte for this layout.
    pub fn magic(self) -> u8 {
        match self {
            Layout::Base => 0xc0,
            Layout::Extended => 0xc2,
        }
    }
}

/// Layout-specific header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDetail {
    /// Inline literal of `literal_len` bytes, then `param_count` packed
    /// parameters (format nibbles + 4-byte words).
    Base { literal_len: u8, param_count: u8 },
    /// Index into the externally supplied string table.
    Extended { str_index: u16 },
}

/// A validated packet header.
///
/// All multi-byte fields are little-endian on the wire, as laid down by the
/// firmware's packed header structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Raw control byte: bits 0-3 sequence, bit 4 sender-dropped flag,
    /// bits 5-7 parameter count (base layout only).
    pub control: u8,
    /// Raw channel byte; see [`crate::channel::channel_tag`].
    pub channel: u8,
    /// 48-bit timestamp in microseconds since boot.
    pub timestamp: u64,
    /// Declared payload length, excluding the end-magic trailer byte.
    pub data_len: usize,
    /// Layout-specific fields.
    pub detail: HeaderDetail,
}

impl Header {
    /// Parse and CRC-check a raw header.
    ///
    /// `raw` must hold exactly the [`HEADER_SIZE`] header bytes, start magic
    /// included. The CRC covers every header byte except the check byte
    /// itself.
    pub fn parse(layout: Layout, raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(FrameError::TruncatedHeader {
                have: raw.len(),
                need: HEADER_SIZE,
            });
        }
        if raw[0] != layout.magic() {
            return Err(FrameError::BadMagic {
                found: raw[0],
                expected: layout.magic(),
            });
        }

        let computed = crc8(&raw[..HEADER_SIZE - 1]);
        let received = raw[HEADER_SIZE - 1];
        if computed != received {
            return Err(FrameError::BadCrc { computed, received });
        }

        let mut buf = &raw[1..];
        let control = buf.get_u8();
        let channel = buf.get_u8();

        Ok(match layout {
            Layout::Base => {
                let literal_len = buf.get_u8();
                let time_lo = buf.get_u32_le();
                let time_hi = buf.get_u16_le();
                let data_len = buf.get_u16_le() as usize;
                Header {
                    control,
                    channel,
                    timestamp: (time_hi as u64) << 32 | time_lo as u64,
                    data_len,
                    detail: HeaderDetail::Base {
                        literal_len,
                        param_count: control >> 5,
                    },
                }
            }
            Layout::Extended => {
                let time_lo = buf.get_u32_le();
                let time_hi = buf.get_u16_le();
                let data_len = buf.get_u8() as usize;
                let str_index = buf.get_u16_le();
                Header {
                    control,
                    channel,
                    timestamp: (time_hi as u64) << 32 | time_lo as u64,
                    data_len,
                    detail: HeaderDetail::Extended { str_index },
                }
            }
        })
    }

    /// 4-bit rolling sequence number.
    pub fn sequence(&self) -> u8 {
        self.control & 0x0f
    }

    /// True if the sender flagged packets dropped before this one.
    pub fn sender_dropped(&self) -> bool {
        self.control & 0x10 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_crc(mut raw: Vec<u8>) -> Vec<u8> {
        let c = crc8(&raw);
        raw.push(c);
        raw
    }

    #[test]
    fn parses_base_header() {
        let raw = with_crc(vec![0xc0, 0x41, 1, 4, 12, 34, 56, 78, 92, 12, 13, 0]);
        let h = Header::parse(Layout::Base, &raw).unwrap();

        assert_eq!(h.sequence(), 1);
        assert!(!h.sender_dropped());
        assert_eq!(h.channel, 1);
        assert_eq!(h.data_len, 13);
        assert_eq!(
            h.detail,
            HeaderDetail::Base {
                literal_len: 4,
                param_count: 2
            }
        );
    }

    #[test]
    fn base_timestamp_is_48_bit_little_endian() {
        let raw = with_crc(vec![0xc0, 0, 1, 0, 12, 34, 56, 78, 90, 12, 0, 0]);
        assert_eq!(raw[12], 33);
        let h = Header::parse(Layout::Base, &raw).unwrap();
        assert_eq!(h.timestamp, 13581998891532);
    }

    #[test]
    fn parses_extended_header() {
        let raw = with_crc(vec![0xc2, 0x12, 5, 12, 34, 56, 78, 90, 12, 9, 2, 0]);
        let h = Header::parse(Layout::Extended, &raw).unwrap();

        assert_eq!(h.sequence(), 2);
        assert!(h.sender_dropped());
        assert_eq!(h.channel, 5);
        assert_eq!(h.data_len, 9);
        assert_eq!(h.detail, HeaderDetail::Extended { str_index: 2 });
        assert_eq!(h.timestamp, 13581998891532);
    }

    #[test]
    fn rejects_bad_crc() {
        let mut raw = with_crc(vec![0xc0, 0, 1, 0, 12, 34, 56, 78, 90, 12, 0, 0]);
        raw[12] ^= 0xff;
        assert!(matches!(
            Header::parse(Layout::Base, &raw),
            Err(FrameError::BadCrc { .. })
        ));
    }

    #[test]
    fn rejects_wrong_magic() {
        let raw = with_crc(vec![0xc2, 0, 1, 0, 12, 34, 56, 78, 90, 12, 0, 0]);
        assert!(matches!(
            Header::parse(Layout::Base, &raw),
            Err(FrameError::BadMagic { .. })
        ));
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(
            Header::parse(Layout::Base, &[0xc0, 0, 1]),
            Err(FrameError::TruncatedHeader { have: 3, need: 13 })
        ));
    }
}
