use silt_index::SkipList;
use tracing::info;

use crate::error::EngineResult;

/// Consumer boundary for frozen memtables.
///
/// When the memtable reaches its entry bound it detaches its skip list and
/// hands the frozen snapshot here. The future sorted-table writer plugs in
/// at this trait; the snapshot is passed by value, so a sink cannot lose it
/// before taking responsibility for it.
pub trait FlushSink {
    /// Take ownership of a frozen snapshot and persist (or discard) it.
    fn flush_memtable(&mut self, snapshot: SkipList) -> EngineResult<()>;
}

/// Sink that drops frozen memtables without persisting them.
///
/// Until sorted on-disk tables exist, flushed entries survive only in the
/// WAL.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardFlush;

impl FlushSink for DiscardFlush {
    fn flush_memtable(&mut self, snapshot: SkipList) -> EngineResult<()> {
        info!(entries = snapshot.len(), "discarding frozen memtable");
        Ok(())
    }
}
