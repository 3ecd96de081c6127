use std::io;

use silt_index::IndexError;
use silt_wal::WalError;

/// Errors surfaced by the storage engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// I/O error while managing the root directory.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Index error: a duplicate put or a delete of an absent key.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Write-ahead log error.
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
}

/// Convenience alias used throughout the engine crate.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
