use std::io;

/// Errors produced by the write-ahead log subsystem.
#[derive(Debug, thiserror::Error)]
pub enum WalError {
    /// I/O error during log file operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Record header failed validation: zero length, unknown type byte, or
    /// a buffer too short for the declared payload.
    #[error("invalid record header at offset {offset}")]
    InvalidRecord { offset: u64 },

    /// Event tag byte is not a known tag, or the buffer ended before the
    /// declared field length.
    #[error("invalid event (tag {tag:#04x})")]
    InvalidEvent { tag: u8 },

    /// CRC integrity check failed for a record during block replay.
    #[error("checksum mismatch at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },
}

/// Convenience alias used throughout the WAL crate.
pub type WalResult<T> = std::result::Result<T, WalError>;
