//! Channel byte classification.
//!
//! The firmware tags every packet with a channel byte. Low values are fixed
//! system channels; bytes with the task bit set identify the emitting task
//! plus how the message was produced (direct, async, or via syscall).

/// Unknown / default channel.
pub const DEFAULT: u8 = 0;

/// Emitted from a task context (bit flag, also channel value 1).
pub const TASK: u8 = 1;

/// System channel.
pub const SYSTEM: u8 = 2;

/// Emitted from interrupt context.
pub const INTERRUPT: u8 = 3;

/// Emitted during early init.
pub const INIT: u8 = 4;

/// Emitted from an exception handler.
pub const EXCEPTION: u8 = 5;

/// Message was produced through a syscall.
pub const FLAG_SYSCALL: u8 = 0x20;

/// Message was produced asynchronously.
pub const FLAG_ASYNC: u8 = 0x40;

/// Low bits carrying the task id.
pub const MASK_TASK_ID: u8 = 0x1f;

/// Render the short channel tag used as the decoded-line prefix.
///
/// Fixed channels get two-character tags; task channels get a letter
/// (`t`/`a` direct/async, `T`/`A` via syscall) plus the task id; anything
/// else falls back to the raw byte in hex.
pub fn channel_tag(channel: u8) -> String {
    match channel {
        DEFAULT => "??".to_string(),
        INTERRUPT => "I.".to_string(),
        INIT => "i.".to_string(),
        EXCEPTION => "E.".to_string(),
        ch if ch & TASK != 0 => {
            let letter = match (ch & FLAG_SYSCALL != 0, ch & FLAG_ASYNC != 0) {
                (true, true) => 'A',
                (true, false) => 'T',
                (false, true) => 'a',
                (false, false) => 't',
            };
            format!("{letter}{}", ch & MASK_TASK_ID)
        }
        ch => format!("{ch:02x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_channels() {
        assert_eq!(channel_tag(DEFAULT), "??");
        assert_eq!(channel_tag(INTERRUPT), "I.");
        assert_eq!(channel_tag(INIT), "i.");
        assert_eq!(channel_tag(EXCEPTION), "E.");
    }

    #[test]
    fn task_channels() {
        assert_eq!(channel_tag(1), "t1");
        assert_eq!(channel_tag(0x41 | 7), "a7");
        assert_eq!(channel_tag(0x21 | 2), "T3");
        assert_eq!(channel_tag(0x61 | 4), "A5");
    }

    #[test]
    fn task_id_masks_low_five_bits() {
        assert_eq!(channel_tag(0x1f), "t31");
    }

    #[test]
    fn unknown_channel_renders_hex() {
        assert_eq!(channel_tag(SYSTEM), "02");
        assert_eq!(channel_tag(0x42), "42");
    }
}
