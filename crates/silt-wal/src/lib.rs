//! Write-ahead log for silt.
//!
//! Three layers, innermost first:
//!
//! - [`Event`] -- the application payload: a tagged, length-prefixed
//!   serialization of one write or delete.
//! - [`Record`] -- the framed unit on disk: CRC-32 checksum, payload
//!   length, type tag, payload. Payloads too large for one block are
//!   chunked into `First`/`Middle`/`Last` runs.
//! - [`Wal`] -- an append-only file of fixed-size blocks, each a run of
//!   whole records followed by zero padding. Appends go to the OS page
//!   cache; [`Wal::flush`] is the durability barrier. Replay is
//!   block-oriented: [`decode_block`] walks one block, verifying each
//!   record's checksum, and treats an invalid header as the start of
//!   padding.
//!
//! # Design Rules
//!
//! 1. Blocks are never rewritten; the log only grows.
//! 2. No record straddles a block boundary; placement pads the current
//!    block when a record does not fit.
//! 3. A zero-length record is never written, so zero padding is always
//!    recognizable as not-a-record.
//! 4. All integrity checking lives at the record layer; events trust the
//!    bytes they are handed.

pub mod error;
pub mod event;
pub mod record;
pub mod wal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{WalError, WalResult};
pub use event::Event;
pub use record::{Record, RecordType, HEADER_SIZE};
pub use wal::{decode_block, Wal, DEFAULT_BLOCK_SIZE};
