//! Base-variant parameter format codes and their renderers.
//!
//! Each packed parameter carries a 4-bit format code. Code [`WIDE64`] is a
//! marker: it merges the next parameter word in as the high 32 bits and
//! shifts that parameter's code into the 64-bit pseudo-code range (+100).

use crate::cursor::PayloadCursor;
use crate::error::Result;
use crate::registry::StructRegistry;

/// Terminator; never appears on a live parameter.
pub const DONE: u16 = 0;
/// Signed 32-bit decimal.
pub const SIGNED: u16 = 1;
/// Unsigned 32-bit decimal.
pub const UNSIGNED: u16 = 2;
/// Zero-padded 32-bit hex.
pub const HEX: u16 = 3;
/// Single quoted character.
pub const CHAR: u16 = 4;
/// Structured firmware error code.
pub const ERR: u16 = 5;
/// Length-prefixed in-payload string.
pub const STRING: u16 = 6;
/// 64-bit extension marker (consumes the following parameter slot).
pub const WIDE64: u16 = 7;
/// Typed binary blob dispatched through the struct handler registry.
pub const BUF_STRUCT: u16 = 12;
/// In-payload string buffer.
pub const BUF_STRING: u16 = 13;
/// Raw byte buffer, rendered as hex pairs.
pub const BUF_BYTES: u16 = 14;
/// Word buffer, rendered as 8-digit hex words.
pub const BUF_WORDS: u16 = 15;

/// 64-bit pseudo-codes, produced by merging via [`WIDE64`].
pub const SIGNED64: u16 = 100 + SIGNED;
pub const UNSIGNED64: u16 = 100 + UNSIGNED;
pub const HEX64: u16 = 100 + HEX;
pub const TIME64: u16 = 100 + CHAR;

/// Render a microsecond timestamp as `seconds.microseconds`.
pub fn fmt_micros(us: u64) -> String {
    format!("{}.{:06}", us / 1_000_000, us % 1_000_000)
}

/// Decode one parameter into text.
///
/// Buffer-based formats consume their bytes from `cursor` (the trailing
/// data region of the payload); a declared size beyond the remaining bytes
/// aborts with [`crate::DecodeError::ShortPayload`].
pub fn decode_param(
    code: u16,
    value: u64,
    cursor: &mut PayloadCursor,
    registry: &StructRegistry,
) -> Result<String> {
    let out = match code {
        SIGNED => format!("{}", value as u32 as i32),
        SIGNED64 => format!("{}", value as i64),
        UNSIGNED | UNSIGNED64 => format!("{value}"),
        HEX => format!("0x{:08x}", value as u32),
        HEX64 => format!("0x{value:016x}"),
        CHAR => format!("'{}'", char::from_u32(value as u32).unwrap_or('\u{fffd}')),
        TIME64 => {
            if value == u64::MAX {
                "(FOREVER)".to_string()
            } else {
                fmt_micros(value)
            }
        }
        ERR => fmt_err(value as u32),
        STRING | BUF_STRING | BUF_STRUCT | BUF_BYTES | BUF_WORDS => {
            let size = (value & 0xffff) as usize;
            if size == 0xffff {
                if code == STRING {
                    "(BadStrPtr)".to_string()
                } else {
                    "(bad size/offs)".to_string()
                }
            } else {
                let buf = cursor.take(size)?;
                match code {
                    STRING | BUF_STRING => String::from_utf8_lossy(&buf).into_owned(),
                    BUF_STRUCT => {
                        let stype = (value >> 16) as u16;
                        registry.render(stype, &buf)
                    }
                    BUF_BYTES => buf
                        .iter()
                        .map(|b| format!("{b:02x}"))
                        .collect::<Vec<_>>()
                        .join(" "),
                    // BUF_WORDS
                    _ => buf
                        .chunks_exact(4)
                        .map(|w| format!("{:08x}", u32::from_le_bytes([w[0], w[1], w[2], w[3]])))
                        .collect::<Vec<_>>()
                        .join(" "),
                }
            }
        }
        code if code > 100 => format!("BadFormatL{}", code - 100),
        code => format!("BadFormat{code}"),
    };
    Ok(out)
}

/// Expand a structured firmware error code.
///
/// The top two bits select the sub-format. The legacy form (3) masks to the
/// low 30 bits; lossy, but that is what the wire carries.
fn fmt_err(value: u32) -> String {
    if value == 0 {
        return "ErrNone".to_string();
    }
    match value >> 30 {
        err_type @ (0 | 1) => {
            let fileno = (value >> 19) & 0x7ff;
            let lineno = (value >> 8) & 0x7ff;
            let mut out = format!("Err#{}", value & 0xff);
            if fileno != 0 {
                out.push_str(&format!(":File#{fileno}"));
            }
            if lineno != 0 {
                let kind = if err_type == 1 { "Instance" } else { "Line" };
                out.push_str(&format!(":{kind}#{lineno}"));
            }
            out
        }
        2 => {
            if (value >> 28) & 0x03 == 0 {
                format!("ErrSub#{}:Code#{}", (value >> 16) & 0xfff, value & 0xffff)
            } else {
                format!("ErrReserved#{value:08x}")
            }
        }
        _ => format!("ErrLegacy0x{:08x}", value & 0x3fff_ffff),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn decode(code: u16, value: u64, trailing: &[u8]) -> String {
        let mut cursor = PayloadCursor::new(Bytes::copy_from_slice(trailing));
        let registry = StructRegistry::new();
        decode_param(code, value, &mut cursor, &registry).unwrap()
    }

    #[test]
    fn signed_sign_extends() {
        assert_eq!(decode(SIGNED, 0xffff_ffff, &[]), "-1");
        assert_eq!(decode(SIGNED, 42, &[]), "42");
        assert_eq!(decode(SIGNED64, u64::MAX, &[]), "-1");
    }

    #[test]
    fn unsigned_and_hex() {
        assert_eq!(decode(UNSIGNED, 0xffff_ffff, &[]), "4294967295");
        assert_eq!(decode(HEX, 0xbeef, &[]), "0x0000beef");
        assert_eq!(decode(HEX64, 0xbeef, &[]), "0x000000000000beef");
    }

    #[test]
    fn char_is_quoted() {
        assert_eq!(decode(CHAR, b'x' as u64, &[]), "'x'");
    }

    #[test]
    fn time_renders_forever_and_micros() {
        assert_eq!(decode(TIME64, u64::MAX, &[]), "(FOREVER)");
        assert_eq!(decode(TIME64, 1_500_042, &[]), "1.500042");
    }

    #[test]
    fn err_code_forms() {
        assert_eq!(decode(ERR, 0, &[]), "ErrNone");
        assert_eq!(decode(ERR, 5, &[]), "Err#5");
        // File 3, line 7, code 9.
        let v = (3u64 << 19) | (7 << 8) | 9;
        assert_eq!(decode(ERR, v, &[]), "Err#9:File#3:Line#7");
        // Instance form (top bits 01).
        let v = (1u64 << 30) | (7 << 8) | 9;
        assert_eq!(decode(ERR, v, &[]), "Err#9:Instance#7");
        // Subcode form (top bits 10, sub-type 0).
        let v = (2u64 << 30) | (5 << 16) | 1234;
        assert_eq!(decode(ERR, v, &[]), "ErrSub#5:Code#1234");
        // Reserved form.
        let v = (2u64 << 30) | (1 << 28);
        assert_eq!(decode(ERR, v, &[]), format!("ErrReserved#{:08x}", v as u32));
        // Legacy form masks to 30 bits.
        let v = (3u64 << 30) | 0x3fff_ffff;
        assert_eq!(decode(ERR, v, &[]), "ErrLegacy0x3fffffff");
    }

    #[test]
    fn string_reads_from_trailing_data() {
        assert_eq!(decode(STRING, 5, b"hellothere"), "hello");
        assert_eq!(decode(STRING, 0xffff, &[]), "(BadStrPtr)");
        assert_eq!(decode(BUF_STRING, 0xffff, &[]), "(bad size/offs)");
    }

    #[test]
    fn byte_and_word_buffers() {
        assert_eq!(decode(BUF_BYTES, 3, &[0xde, 0xad, 0x01]), "de ad 01");
        assert_eq!(
            decode(BUF_WORDS, 8, &[1, 0, 0, 0, 0xff, 0, 0, 0x80]),
            "00000001 800000ff"
        );
    }

    #[test]
    fn struct_without_handler_uses_default() {
        let rendered = decode(BUF_STRUCT, (9u64 << 16) | 4, &[1, 2, 3, 4]);
        assert_eq!(rendered, "BadStruct#9(4)");
    }

    #[test]
    fn unknown_codes_render_placeholders() {
        assert_eq!(decode(9, 1, &[]), "BadFormat9");
        assert_eq!(decode(109, 1, &[]), "BadFormatL9");
    }

    #[test]
    fn short_buffer_read_is_an_error() {
        let mut cursor = PayloadCursor::new(Bytes::from_static(&[1, 2]));
        let registry = StructRegistry::new();
        assert!(decode_param(STRING, 8, &mut cursor, &registry).is_err());
    }
}
