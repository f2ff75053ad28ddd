//! Payload decoding for embedded console log packets.
//!
//! [`conwire_frame`] recognizes frames in the byte stream; this crate turns
//! validated frames back into the diagnostic text the firmware meant to
//! print. Two payload encodings exist on the wire:
//!
//! - **Base**: an inline literal string with `$` substitution points, a
//!   packed array of format nibbles, and one 4-byte word per parameter.
//! - **Extended**: an index into a build-time compiled string table whose
//!   entries carry printf-style format specifiers matched against a packed
//!   parameter area.
//!
//! The [`Decoder`] engine composes the frame assembler with sequence/reboot
//! tracking and either payload decoder behind the byte-push interface the
//! terminal tooling drives: `feed(byte)`, `take_decoded()`, `take_errors()`.

pub mod cursor;
pub mod engine;
pub mod error;
pub mod format;
pub mod handlers;
pub mod registry;
pub mod stream;
pub mod strings;
pub mod template;

pub use cursor::PayloadCursor;
pub use engine::Decoder;
pub use error::{DecodeError, Result};
pub use registry::{StructHandler, StructRegistry};
pub use stream::{DecodeReader, Output};
pub use strings::StringTable;
