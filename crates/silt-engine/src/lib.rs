//! Storage engine for silt.
//!
//! [`Engine`] is the facade callers talk to: `put`/`get`/`remove` over an
//! embedded, single-process, ordered key-value store. Writes follow the
//! durability-before-visibility contract -- every mutation is serialized as
//! an event and appended to the write-ahead log before the in-memory
//! [`Memtable`] changes, so acknowledged state is always recoverable from
//! the log.
//!
//! The memtable is a thin capacity bound over a `silt-index` skip list.
//! When it fills, the list is frozen and handed to a [`FlushSink`]; the
//! sorted-table writer that will persist those snapshots plugs in there.
//!
//! # Design Rules
//!
//! 1. WAL append happens-before the corresponding memtable mutation.
//! 2. A mutation rejected by the memtable is still in the log; replay
//!    re-applies it.
//! 3. All operations run to completion on the caller's thread; there are
//!    no background tasks.

pub mod engine;
pub mod error;
pub mod flush;
pub mod memtable;

// Re-export primary types at crate root for ergonomic imports.
pub use engine::{Engine, EngineOptions, WAL_FILE_NAME};
pub use error::{EngineError, EngineResult};
pub use flush::{DiscardFlush, FlushSink};
pub use memtable::Memtable;
