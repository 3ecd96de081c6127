use silt_index::SkipList;
use tracing::info;

use crate::error::EngineResult;
use crate::flush::{DiscardFlush, FlushSink};

/// Capacity-bounded in-memory write buffer over a [`SkipList`].
///
/// When an insert arrives while the list already holds `max_size` entries,
/// the list is frozen: detached wholesale, replaced with a fresh empty one,
/// and handed to the flush sink. The triggering pair is not retained in
/// memory; it remains in the WAL and is re-applied by replay.
pub struct Memtable {
    list: SkipList,
    max_size: usize,
    sink: Box<dyn FlushSink>,
}

impl Memtable {
    /// Empty memtable bounded at `max_size` entries, discarding flushes.
    pub fn new(max_size: usize) -> Self {
        Self::with_sink(max_size, Box::new(DiscardFlush))
    }

    /// Empty memtable handing frozen snapshots to `sink`.
    pub fn with_sink(max_size: usize, sink: Box<dyn FlushSink>) -> Self {
        Self {
            list: SkipList::new(),
            max_size,
            sink,
        }
    }

    /// Insert a pair, or freeze and flush if the entry bound is reached.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        if self.list.len() >= self.max_size {
            let frozen = std::mem::replace(&mut self.list, SkipList::new());
            info!(entries = frozen.len(), max_size = self.max_size, "memtable frozen");
            self.sink.flush_memtable(frozen)?;
            return Ok(());
        }
        self.list.insert(key, value)?;
        Ok(())
    }

    /// Borrowed view of the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.list.get(key)
    }

    /// Remove `key` from the live list.
    pub fn remove(&mut self, key: &[u8]) -> EngineResult<()> {
        self.list.remove(key)?;
        Ok(())
    }

    /// Number of entries in the live list.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the live list is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl std::fmt::Debug for Memtable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memtable")
            .field("len", &self.list.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}
