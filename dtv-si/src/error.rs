//! Error types for SI decoding.

use thiserror::Error;

/// Errors produced while decoding sections, tables and descriptors.
///
/// Decode errors abort only the current table or descriptor. Partially
/// decoded entries that were already built stay valid; callers decide
/// whether to keep or discard them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SiError {
    /// Buffer exhausted before a required field.
    #[error("short read: wanted {wanted} bytes, got {available}")]
    ShortRead { wanted: usize, available: usize },

    /// A declared length field exceeds the remaining buffer.
    #[error("truncated: declared length {declared}, only {remaining} bytes remain")]
    Truncated { declared: usize, remaining: usize },

    /// The section does not belong to the requested decoder. Callers
    /// demultiplexing a single PID use this to route sections.
    #[error("{decoder}: wrong table id 0x{found:02x}")]
    WrongTableId { decoder: &'static str, found: u8 },

    /// TS packet sync byte was not 0x47.
    #[error("invalid sync byte 0x{0:02x}")]
    InvalidSyncByte(u8),

    /// PES stream id for which no optional header format is defined.
    #[error("unsupported PES stream id 0x{0:02x}")]
    UnsupportedStream(u8),
}
