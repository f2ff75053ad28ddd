/// Errors that can occur while parsing frame headers.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header buffer is shorter than the fixed header size.
    #[error("truncated header ({have} bytes, need {need})")]
    TruncatedHeader { have: usize, need: usize },

    /// The first header byte is not the layout's start magic.
    #[error("bad start magic 0x{found:02x} (expected 0x{expected:02x})")]
    BadMagic { found: u8, expected: u8 },

    /// The header CRC-8 does not match the received check byte.
    #[error("header CRC mismatch (computed 0x{computed:02x}, received 0x{received:02x})")]
    BadCrc { computed: u8, received: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
