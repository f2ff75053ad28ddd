/// Errors that can occur while decoding frame payloads.
///
/// These are recoverable, per-frame conditions: the engine converts them
/// into error annotations or inline markers and keeps decoding subsequent
/// frames.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A variable-length field asked for more bytes than the payload holds.
    #[error("payload exhausted (wanted {wanted} bytes, {remaining} remaining)")]
    ShortPayload { wanted: usize, remaining: usize },

    /// A string-table reference points past the end of the table.
    #[error("string index {index} out of range (table holds {len})")]
    BadStringIndex { index: u32, len: usize },

    /// A string-table blob could not be loaded.
    #[error("failed to load string table: {0}")]
    StringTableLoad(std::io::Error),

    /// The underlying byte stream failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
