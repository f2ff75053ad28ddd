//! Extended-variant template expansion.
//!
//! Extended packets carry no text, only an index into the compiled string
//! table plus a packed parameter area. The table entry is a C format
//! string; this module re-implements just enough of the printf grammar to
//! expand the parameters the firmware actually packs:
//!
//! - integer specs (`%d %u %x %X %c`, `ll` for 8-byte values, `z` stripped),
//!   with printf precision (`%.3d` zero-pads to at least 3 digits) and the
//!   firmware's fixed-point extension `%<w>.<p>d` which divides the raw
//!   integer by `10^p` (width and precision both present)
//! - string specs (`%s`), inline NUL-terminated or a `0xFF`-sentinel
//!   reference back into the string table (function names); precision
//!   truncates (`%.4s` keeps the first 4 characters)
//! - pointer specs `%pP` (8-digit hex word), `%pT` (64-bit timestamp,
//!   zero meaning "now"), `%ph` (length-prefixed hex dump)
//!
//! Anything else produces an `unprocessed format` annotation and is
//! dropped. Parameter bytes the template does not consume are discarded.

use crate::format::fmt_micros;
use crate::strings::StringTable;

/// Marker replaced by the frame's own timestamp when it opens a template.
const TIMESTAMP_MARKER: &str = "[^T";

/// Sentinel first byte marking a string parameter as a table reference.
const STRING_REF_SENTINEL: u8 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conv {
    Signed,
    Unsigned,
    HexLower,
    HexUpper,
    Char,
}

#[derive(Debug, Clone, Copy)]
struct IntSpec {
    conv: Conv,
    wide: bool,
    left: bool,
    zero: bool,
    width: usize,
    /// Minimum digit count when the spec is precision-only (`%.3d`).
    precision: Option<usize>,
    /// Fixed-point divisor exponent when the spec is `<int>.<int>`.
    fixed_exp: Option<u32>,
    /// Token offset just past the conversion character.
    end: usize,
}

/// Expand a format template against a packed parameter area.
///
/// `timestamp_us` is the frame's header timestamp, used by the leading
/// timestamp marker and by `%pT` with a zero value. Recoverable oddities
/// (unknown specs, bad table references) are appended to `errors`; a
/// parameter area shorter than the template demands stops expansion with a
/// `(bad len)` marker in the text.
pub fn expand(
    template: &str,
    data: &[u8],
    timestamp_us: u64,
    strings: &StringTable,
    errors: &mut Vec<String>,
) -> String {
    let rewritten;
    let template = match template.strip_prefix(TIMESTAMP_MARKER) {
        Some(rest) => {
            rewritten = format!("[{} {}]\n", fmt_micros(timestamp_us), rest);
            rewritten.as_str()
        }
        None => template,
    };

    let mut data = data;
    let mut tokens = template.split('%');
    let mut out = tokens.next().unwrap_or_default().to_string();

    while let Some(token) = tokens.next() {
        // Two consecutive '%' split into an empty token: an escaped percent.
        // The following token is plain text.
        if token.is_empty() {
            out.push('%');
            if let Some(literal) = tokens.next() {
                out.push_str(literal);
            }
            continue;
        }

        if let Some(spec) = parse_int_spec(token) {
            let size = if spec.wide { 8 } else { 4 };
            let Some(raw) = take(&mut data, size) else {
                out.push_str(" (bad len)");
                break;
            };
            out.push_str(&render_int(spec, raw));
            out.push_str(&token[spec.end..]);
            continue;
        }

        if let Some(end) = parse_str_spec(token) {
            if !expand_str_spec(token, end, &mut data, strings, &mut out, errors) {
                out.push_str(" (bad len)");
                break;
            }
            continue;
        }

        if let Some(kind) = parse_ptr_spec(token) {
            if !expand_ptr_spec(kind, token, &mut data, timestamp_us, &mut out) {
                out.push_str(" (bad len)");
                break;
            }
            continue;
        }

        errors.push(format!("unprocessed format %{token}"));
    }

    out
}

fn take<'d>(data: &mut &'d [u8], count: usize) -> Option<&'d [u8]> {
    if data.len() < count {
        return None;
    }
    let (head, tail) = data.split_at(count);
    *data = tail;
    Some(head)
}

/// Leading flag/width/precision characters shared by the int and string
/// grammars.
fn flags_len(token: &str) -> usize {
    token
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b'.' || *b == b'-')
        .count()
}

fn parse_int_spec(token: &str) -> Option<IntSpec> {
    let flags_end = flags_len(token);
    let flags = &token[..flags_end];
    let mut i = flags_end;

    let rest = &token[i..];
    let wide = rest.starts_with("ll");
    if wide {
        i += 2;
    } else if rest.starts_with('l') || rest.starts_with('z') {
        // 'z' is size_t on the target; observed behavior is default width.
        i += 1;
    }

    let conv = match token.as_bytes().get(i)? {
        b'd' => Conv::Signed,
        b'u' => Conv::Unsigned,
        b'x' => Conv::HexLower,
        b'X' => Conv::HexUpper,
        b'c' => Conv::Char,
        _ => return None,
    };

    let left = flags.contains('-');
    let trimmed = flags.trim_start_matches('-');
    let zero = trimmed.starts_with('0');
    let (width_part, precision_part) = match trimmed.split_once('.') {
        Some((w, p)) => (w, Some(p)),
        None => (trimmed, None),
    };
    let width = width_part.parse().unwrap_or(0);
    // The fixed-point extension reuses `<width>.<precision>`: both halves
    // present and numeric means "divide by 10^precision". A precision with
    // no width is ordinary printf precision (minimum digit count).
    let fixed_exp = match precision_part {
        Some(p) if !width_part.is_empty() && !flags.contains('-') => p.parse().ok(),
        _ => None,
    };
    let precision = match precision_part {
        Some(p) if fixed_exp.is_none() => p.parse().ok(),
        _ => None,
    };

    Some(IntSpec {
        conv,
        wide,
        left,
        zero,
        width,
        precision,
        fixed_exp,
        end: i + 1,
    })
}

fn render_int(spec: IntSpec, raw: &[u8]) -> String {
    let unsigned = if spec.wide {
        u64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ])
    } else {
        u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64
    };
    let signed = if spec.wide {
        unsigned as i64
    } else {
        unsigned as u32 as i32 as i64
    };

    if let Some(exp) = spec.fixed_exp {
        let value = match spec.conv {
            Conv::Signed => signed as f64,
            _ => unsigned as f64,
        };
        return format!("{:.6}", value / 10f64.powi(exp as i32));
    }

    let mut digits = match spec.conv {
        Conv::Signed => signed.to_string(),
        Conv::Unsigned => unsigned.to_string(),
        Conv::HexLower => format!("{unsigned:x}"),
        Conv::HexUpper => format!("{unsigned:X}"),
        Conv::Char => char::from_u32(unsigned as u32)
            .unwrap_or('\u{fffd}')
            .to_string(),
    };
    if let Some(precision) = spec.precision {
        if spec.conv != Conv::Char {
            digits = min_digits(digits, precision);
        }
    }
    pad(digits, spec.left, spec.zero && spec.conv != Conv::Char, spec.width)
}

/// Zero-fill to at least `precision` digits, sign excluded.
fn min_digits(s: String, precision: usize) -> String {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", s.as_str()),
    };
    if digits.len() >= precision {
        return s;
    }
    format!("{sign}{}{digits}", "0".repeat(precision - digits.len()))
}

fn pad(s: String, left: bool, zero: bool, width: usize) -> String {
    if s.len() >= width {
        return s;
    }
    let fill = width - s.len();
    if left {
        format!("{s}{}", " ".repeat(fill))
    } else if zero {
        // Zero padding goes between the sign and the digits.
        match s.strip_prefix('-') {
            Some(digits) => format!("-{}{digits}", "0".repeat(fill)),
            None => format!("{}{s}", "0".repeat(fill)),
        }
    } else {
        format!("{}{s}", " ".repeat(fill))
    }
}

/// Returns the offset just past the `s` conversion when `token` is a
/// string spec.
fn parse_str_spec(token: &str) -> Option<usize> {
    let flags_end = flags_len(token);
    (token.as_bytes().get(flags_end) == Some(&b's')).then_some(flags_end + 1)
}

fn expand_str_spec(
    token: &str,
    end: usize,
    data: &mut &[u8],
    strings: &StringTable,
    out: &mut String,
    errors: &mut Vec<String>,
) -> bool {
    let text;
    if data.first() == Some(&STRING_REF_SENTINEL) {
        let Some(raw) = take(data, 5) else {
            return false;
        };
        let index = u32::from_le_bytes([raw[1], raw[2], raw[3], raw[4]]);
        match strings.get(index) {
            Some(name) => text = name.to_string(),
            None => {
                errors.push(format!("(bad string index {index})"));
                text = String::new();
            }
        }
    } else {
        // Inline NUL-terminated string; a missing terminator consumes the
        // remaining bytes, but an already-exhausted area is a length error.
        if data.is_empty() {
            return false;
        }
        let nul = data.iter().position(|&b| b == 0);
        let len = nul.unwrap_or(data.len());
        let Some(raw) = take(data, len) else {
            return false;
        };
        text = String::from_utf8_lossy(raw).into_owned();
        if nul.is_some() {
            let _ = take(data, 1);
        }
    }

    let flags = &token[..end - 1];
    let left = flags.contains('-');
    let trimmed = flags.trim_start_matches('-');
    let (width_part, precision_part) = match trimmed.split_once('.') {
        Some((w, p)) => (w, Some(p)),
        None => (trimmed, None),
    };
    let width = width_part.parse().unwrap_or(0);
    // Precision truncates the string.
    let text = match precision_part.and_then(|p| p.parse::<usize>().ok()) {
        Some(precision) => text.chars().take(precision).collect(),
        None => text,
    };
    out.push_str(&pad(text, left, false, width));
    out.push_str(&token[end..]);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PtrKind {
    Word,
    Timestamp,
    HexDump,
}

fn parse_ptr_spec(token: &str) -> Option<PtrKind> {
    let mut bytes = token.bytes();
    if bytes.next() != Some(b'p') {
        return None;
    }
    match bytes.next() {
        Some(b'P') => Some(PtrKind::Word),
        Some(b'T') => Some(PtrKind::Timestamp),
        Some(b'h') => Some(PtrKind::HexDump),
        _ => None,
    }
}

fn expand_ptr_spec(
    kind: PtrKind,
    token: &str,
    data: &mut &[u8],
    timestamp_us: u64,
    out: &mut String,
) -> bool {
    let rest = &token[2..];
    match kind {
        PtrKind::Word => {
            let Some(raw) = take(data, 4) else {
                return false;
            };
            let v = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            out.push_str(&format!("{v:08x}"));
        }
        PtrKind::Timestamp => {
            let Some(raw) = take(data, 8) else {
                return false;
            };
            let mut v = u64::from_le_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]);
            if v == 0 {
                // "Now", taken from the packet header.
                v = timestamp_us;
            }
            out.push_str(&v.to_string());
        }
        PtrKind::HexDump => {
            let Some(raw) = take(data, 2) else {
                return false;
            };
            let len = u16::from_le_bytes([raw[0], raw[1]]) as usize;
            let Some(buf) = take(data, len) else {
                return false;
            };
            let dump: Vec<String> = buf.iter().map(|b| format!("{b:02x}")).collect();
            out.push_str(&dump.join(" "));
        }
    }
    out.push_str(rest);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(template: &str, data: &[u8]) -> (String, Vec<String>) {
        let strings = StringTable::from_entries(["zero", "one", "func_name"]);
        let mut errors = Vec::new();
        let text = expand(template, data, 1_500_000, &strings, &mut errors);
        (text, errors)
    }

    #[test]
    fn plain_text_passes_through() {
        let (text, errors) = run("no specs here", &[]);
        assert_eq!(text, "no specs here");
        assert!(errors.is_empty());
    }

    #[test]
    fn integer_specs() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-5i32).to_le_bytes());
        data.extend_from_slice(&0xbeefu32.to_le_bytes());
        let (text, errors) = run("v=%d h=%08x", &data);
        assert_eq!(text, "v=-5 h=0000beef");
        assert!(errors.is_empty());
    }

    #[test]
    fn wide_and_upper_hex() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x1_0000_0001u64.to_le_bytes());
        data.extend_from_slice(&0xabu32.to_le_bytes());
        let (text, _) = run("%llu %X", &data);
        assert_eq!(text, "4294967297 AB");
    }

    #[test]
    fn z_modifier_reads_four_bytes() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&9u32.to_le_bytes());
        let (text, _) = run("%zu %u", &data);
        assert_eq!(text, "7 9");
    }

    #[test]
    fn char_spec() {
        let (text, _) = run("[%c]", &(b'Q' as u32).to_le_bytes());
        assert_eq!(text, "[Q]");
    }

    #[test]
    fn width_and_alignment() {
        let data = 42u32.to_le_bytes();
        assert_eq!(run("%6d", &data).0, "    42");
        assert_eq!(run("%-6d!", &data).0, "42    !");
        let neg = (-1i32).to_le_bytes();
        assert_eq!(run("%04d", &neg).0, "-001");
    }

    #[test]
    fn precision_zero_fills_integers() {
        let data = 5u32.to_le_bytes();
        assert_eq!(run("%.3d", &data).0, "005");
        assert_eq!(run("%.4x", &data).0, "0005");
        assert_eq!(run("%.1u", &data).0, "5");
        let neg = (-5i32).to_le_bytes();
        assert_eq!(run("%.3d", &neg).0, "-005");
    }

    #[test]
    fn precision_truncates_strings() {
        assert_eq!(run("%.4s", b"abcdefgh\0").0, "abcd");
        assert_eq!(run("%6.4s|", b"abcdefgh\0").0, "  abcd|");
    }

    #[test]
    fn fixed_point_divides_by_power_of_ten() {
        let data = 1500i32.to_le_bytes();
        let (text, _) = run("%1.3d V", &data);
        assert_eq!(text, "1.500000 V");
    }

    #[test]
    fn escaped_percent() {
        let data = 50u32.to_le_bytes();
        let (text, errors) = run("%d%% done", &data);
        assert_eq!(text, "50% done");
        assert!(errors.is_empty());
    }

    #[test]
    fn inline_string_parameter() {
        let mut data = b"ext param\0".to_vec();
        data.extend_from_slice(&230u32.to_le_bytes());
        let (text, errors) = run("string %s %d", &data);
        assert_eq!(text, "string ext param 230");
        assert!(errors.is_empty());
    }

    #[test]
    fn string_reference_through_sentinel() {
        let mut data = vec![0xff];
        data.extend_from_slice(&2u32.to_le_bytes());
        let (text, errors) = run("in %s()", &data);
        assert_eq!(text, "in func_name()");
        assert!(errors.is_empty());
    }

    #[test]
    fn bad_string_reference_is_annotated() {
        let mut data = vec![0xff];
        data.extend_from_slice(&99u32.to_le_bytes());
        let (text, errors) = run("in %s()", &data);
        assert_eq!(text, "in ()");
        assert_eq!(errors, vec!["(bad string index 99)"]);
    }

    #[test]
    fn string_width_pads() {
        let (text, _) = run("%6s|", b"ab\0");
        assert_eq!(text, "    ab|");
        let (text, _) = run("%-6s|", b"ab\0");
        assert_eq!(text, "ab    |");
    }

    #[test]
    fn pointer_word() {
        let data = 0xdead_beefu32.to_le_bytes();
        let (text, _) = run("at %pP end", &data);
        assert_eq!(text, "at deadbeef end");
    }

    #[test]
    fn pointer_timestamp_zero_uses_header_time() {
        let (text, _) = run("t=%pT", &0u64.to_le_bytes());
        assert_eq!(text, "t=1500000");
        let (text, _) = run("t=%pT", &77u64.to_le_bytes());
        assert_eq!(text, "t=77");
    }

    #[test]
    fn pointer_hex_dump() {
        let mut data = 3u16.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xde, 0xad, 0x01]);
        let (text, _) = run("buf %ph.", &data);
        assert_eq!(text, "buf de ad 01.");
    }

    #[test]
    fn unknown_spec_is_annotated_and_dropped() {
        let (text, errors) = run("a %q b", &[]);
        assert_eq!(text, "a ");
        assert_eq!(errors, vec!["unprocessed format %q b"]);
    }

    #[test]
    fn short_parameter_area_stops_expansion() {
        let (text, _) = run("%d and %d", &5u32.to_le_bytes()[..2]);
        assert_eq!(text, " (bad len)");
    }

    #[test]
    fn string_spec_with_exhausted_area_marks_bad_len() {
        let (text, _) = run("%s", &[]);
        assert_eq!(text, " (bad len)");
        let mut data = 3u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"ok\0");
        let (text, _) = run("%u %s %s", &data);
        assert_eq!(text, "3 ok  (bad len)");
    }

    #[test]
    fn timestamp_marker_prefixes_header_time() {
        let (text, _) = run("[^Tboot complete", &[]);
        assert_eq!(text, "[1.500000 boot complete]\n");
    }

    #[test]
    fn leftover_parameter_bytes_are_discarded() {
        let mut data = 1u32.to_le_bytes().to_vec();
        data.extend_from_slice(&[9, 9, 9, 9]);
        let (text, errors) = run("%u", &data);
        assert_eq!(text, "1");
        assert!(errors.is_empty());
    }
}
