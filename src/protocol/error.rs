//! Error types for the wire protocol.

use thiserror::Error;

/// Errors raised while encoding or decoding wire frames.
///
/// `Eof` is reported only when the stream ends before the first byte of the
/// value being decoded; observed at a frame boundary it is a clean
/// disconnect. Every other variant means the frame itself was malformed or
/// cut short and the connection cannot be trusted further.
#[derive(Debug, Error)]
pub enum WireError {
    /// Stream ended cleanly before the value started
    #[error("stream closed")]
    Eof,

    /// Stream ended in the middle of a frame
    #[error("stream ended mid-frame")]
    Truncated,

    /// Declared length is negative or exceeds the frame size limit
    #[error("invalid frame length: {0}")]
    InvalidLength(i32),

    /// String payload is not valid UTF-8
    #[error("invalid UTF-8 in string frame")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Opcode tag is neither Register (1) nor Send (2)
    #[error("unknown opcode: {0}")]
    UnknownOpcode(i32),

    /// Underlying transport error
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Reinterpret a clean end-of-stream as a truncation.
    ///
    /// Used by composite decoders: once the leading length of a string or
    /// list has been consumed, the stream ending before the promised payload
    /// is a malformed frame, not a clean disconnect.
    pub(crate) fn mid_frame(self) -> Self {
        match self {
            WireError::Eof => WireError::Truncated,
            other => other,
        }
    }

    /// True when the peer closed the stream at a value boundary.
    pub fn is_clean_eof(&self) -> bool {
        matches!(self, WireError::Eof)
    }
}
