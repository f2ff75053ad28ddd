//! Embedded console log packet decoder.
//!
//! Firmware consoles interleave raw text with binary log packets: framed,
//! CRC-protected records that carry a compressed form of the message the
//! firmware would otherwise have printed. conwire reconstructs the original
//! diagnostic text on the host.
//!
//! # Crate Structure
//!
//! - [`frame`] — Wire format: frame detection, header parsing, CRC-8
//! - [`decode`] — Payload decoding: format codes, struct handlers, string
//!   tables, the streaming decode engine

/// Re-export wire format types.
pub mod frame {
    pub use conwire_frame::*;
}

/// Re-export payload decoding types.
pub mod decode {
    pub use conwire_decode::*;
}
