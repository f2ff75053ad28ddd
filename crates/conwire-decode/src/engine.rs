use std::sync::Arc;

use conwire_frame::{channel_tag, Assembler, Frame, HeaderDetail, Layout, Step, END_MAGIC};
use tracing::{debug, trace};

use crate::cursor::PayloadCursor;
use crate::error::Result;
use crate::format::{self, fmt_micros};
use crate::registry::StructRegistry;
use crate::strings::StringTable;
use crate::template;

/// Streaming packet decoder.
///
/// Owns one frame assembler plus the cross-frame state the wire protocol
/// requires: the expected next sequence number and the last observed
/// timestamp (for reboot detection). Decoded text and error annotations
/// accumulate until drained with [`take_decoded`](Self::take_decoded) /
/// [`take_errors`](Self::take_errors).
///
/// Nothing here is fatal: corrupt headers are dropped silently, every
/// other anomaly decodes as far as possible and leaves an annotation.
pub struct Decoder {
    assembler: Assembler,
    registry: Arc<StructRegistry>,
    strings: Option<Arc<StringTable>>,
    next_seq: Option<u8>,
    last_timestamp: u64,
    decoded: String,
    errors: Vec<String>,
}

impl Decoder {
    /// Decoder for the base layout (inline literals + packed parameters).
    ///
    /// The registry is shared, read-only; populate it before decoding.
    pub fn base(registry: Arc<StructRegistry>) -> Self {
        Self::new(Layout::Base, registry, None)
    }

    /// Decoder for the extended layout (string-table indexed templates).
    pub fn extended(strings: Arc<StringTable>) -> Self {
        Self::new(Layout::Extended, Arc::new(StructRegistry::new()), Some(strings))
    }

    fn new(
        layout: Layout,
        registry: Arc<StructRegistry>,
        strings: Option<Arc<StringTable>>,
    ) -> Self {
        Self {
            assembler: Assembler::new(layout),
            registry,
            strings,
            next_seq: None,
            last_timestamp: 0,
            decoded: String::new(),
            errors: Vec::new(),
        }
    }

    /// Wire layout this decoder expects.
    pub fn layout(&self) -> Layout {
        self.assembler.layout()
    }

    /// Sequence number the next frame should carry, once known.
    pub fn expected_sequence(&self) -> Option<u8> {
        self.next_seq
    }

    /// Feed one received byte.
    ///
    /// Returns true if the byte was consumed as part of a frame; false
    /// means the byte is raw console text the caller should display as-is.
    pub fn feed(&mut self, byte: u8) -> bool {
        match self.assembler.push(byte) {
            Step::NotFrame => false,
            Step::Pending => true,
            Step::Complete(frame) => {
                self.decode_frame(frame);
                true
            }
        }
    }

    /// Return and clear the buffered decoded text.
    pub fn take_decoded(&mut self) -> String {
        std::mem::take(&mut self.decoded)
    }

    /// Return and clear the buffered error annotations.
    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    fn decode_frame(&mut self, frame: Frame) {
        let header = frame.header;
        trace!(
            seq = header.sequence(),
            channel = header.channel,
            len = header.data_len,
            "decoding frame"
        );

        // A timestamp regression means the target rebooted and restarted
        // its sequence counter; this takes priority over gap detection.
        if header.timestamp < self.last_timestamp {
            debug!(
                timestamp = header.timestamp,
                last = self.last_timestamp,
                "timestamp regression, resetting sequence"
            );
            self.next_seq = Some(0);
        }
        self.last_timestamp = header.timestamp;

        if header.sender_dropped() {
            self.errors.push("(sender dropped packet(s))".to_string());
        }

        let seq = header.sequence();
        if let Some(expect) = self.next_seq {
            if seq != expect {
                debug!(got = seq, expect, "sequence gap");
                self.errors
                    .push(format!("(missing packet(s)); got {seq} expect {expect}"));
            }
        }
        self.next_seq = Some((seq + 1) % 16);

        // The header already passed its CRC, so decode even when the
        // trailer is wrong; just flag the possible corruption.
        if header.data_len > 0 && frame.data.last() != Some(&END_MAGIC) {
            self.errors
                .push("(packet data missing end magic; may be corrupt)".to_string());
        }

        match header.detail {
            HeaderDetail::Base {
                literal_len,
                param_count,
            } => self.decode_base(&frame, literal_len, param_count),
            HeaderDetail::Extended { str_index } => self.decode_extended(&frame, str_index),
        }
    }

    fn decode_base(&mut self, frame: &Frame, literal_len: u8, param_count: u8) {
        let header = &frame.header;
        let mut out = format!(
            "[{}/{}]",
            fmt_micros(header.timestamp),
            channel_tag(header.channel)
        );

        let mut cursor = PayloadCursor::new(frame.data.clone());
        let mut literal = String::new();
        let mut params = Vec::new();
        let truncated = self
            .read_base_params(&mut cursor, literal_len, param_count, &mut literal, &mut params)
            .is_err();

        // `$` substitutes the next parameter; `%` escapes the following
        // character; leftover parameters are appended space-separated.
        if !literal.is_empty() {
            out.push(' ');
        }
        let mut params = params.into_iter();
        let mut chars = literal.chars();
        while let Some(c) = chars.next() {
            match c {
                '$' => {
                    if let Some(p) = params.next() {
                        out.push_str(&p);
                    }
                }
                '%' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        let leftover: Vec<String> = params.collect();
        if !leftover.is_empty() {
            out.push(' ');
            out.push_str(&leftover.join(" "));
        }

        if truncated {
            out.push_str(" (bad len)");
        }
        self.decoded.push_str(&out);
    }

    /// Read the literal string and decode the packed parameters.
    ///
    /// Parameters decoded before a length overrun are kept; the caller
    /// marks the truncation.
    fn read_base_params(
        &self,
        cursor: &mut PayloadCursor,
        literal_len: u8,
        param_count: u8,
        literal: &mut String,
        params: &mut Vec<String>,
    ) -> Result<()> {
        if literal_len > 0 {
            let raw = cursor.take(literal_len as usize)?;
            *literal = String::from_utf8_lossy(&raw).into_owned();
        }

        let count = param_count as usize;
        if count == 0 {
            return Ok(());
        }

        // One format nibble per parameter, two per byte.
        let packed = cursor.take(count.div_ceil(2))?;
        let mut codes = Vec::with_capacity(count + 1);
        for b in packed.iter() {
            codes.push((b & 0x0f) as u16);
            codes.push((b >> 4) as u16);
        }

        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(cursor.take_u32_le()?);
        }

        let mut p = 0;
        while p < count {
            let mut value = words[p] as u64;
            let mut code = codes[p];
            p += 1;
            // The 64-bit marker merges the next slot as the high word and
            // shifts its code into the pseudo-code range.
            if code == format::WIDE64 && p < count {
                value |= (words[p] as u64) << 32;
                code = codes[p] + 100;
                p += 1;
            }
            params.push(format::decode_param(code, value, cursor, &self.registry)?);
        }
        Ok(())
    }

    fn decode_extended(&mut self, frame: &Frame, str_index: u16) {
        let Some(strings) = self.strings.clone() else {
            self.errors.push("(no string table loaded)".to_string());
            return;
        };
        let Some(template_str) = strings.get(str_index as u32) else {
            debug!(index = str_index, table_len = strings.len(), "string index out of range");
            self.errors
                .push(format!("(unknown string index {str_index})"));
            return;
        };

        let data_len = frame.header.data_len.min(frame.data.len());
        let text = template::expand(
            template_str,
            &frame.data[..data_len],
            frame.header.timestamp,
            &strings,
            &mut self.errors,
        );
        self.decoded.push_str(&text);
    }
}
