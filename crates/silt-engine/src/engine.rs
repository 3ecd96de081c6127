use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use silt_wal::{Event, Wal, DEFAULT_BLOCK_SIZE};

use crate::error::EngineResult;
use crate::flush::FlushSink;
use crate::memtable::Memtable;

/// Name of the log file inside the root directory.
pub const WAL_FILE_NAME: &str = "wal.log";

/// Configuration for [`Engine::open`].
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Directory holding the database files; created if absent.
    pub root_dir: PathBuf,
    /// Memtable entry count at which it is frozen and flushed.
    pub memtable_flush_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("silt-data"),
            memtable_flush_limit: 1024,
        }
    }
}

/// The storage engine facade.
///
/// Maps `put`/`get`/`remove` onto the WAL and the memtable, in that order:
/// every mutation is appended to the log before it becomes visible in
/// memory, so a crash can only lose acknowledged-but-unsynced tail bytes,
/// never invert the order. Reads are served from the memtable alone.
///
/// Single-threaded and blocking; callers serialize operations.
pub struct Engine {
    root_dir: PathBuf,
    memtable: Memtable,
    wal: Wal,
}

impl Engine {
    /// Open a database rooted at `options.root_dir`, creating the directory
    /// (relative or absolute) if it does not exist. Opening an existing
    /// root is idempotent.
    pub fn open(options: EngineOptions) -> EngineResult<Self> {
        let memtable = Memtable::new(options.memtable_flush_limit);
        Self::build(options, memtable)
    }

    /// Open with a caller-provided flush sink instead of the discarding one.
    pub fn open_with_sink(options: EngineOptions, sink: Box<dyn FlushSink>) -> EngineResult<Self> {
        let memtable = Memtable::with_sink(options.memtable_flush_limit, sink);
        Self::build(options, memtable)
    }

    fn build(options: EngineOptions, memtable: Memtable) -> EngineResult<Self> {
        fs::create_dir_all(&options.root_dir)?;
        let wal = Wal::open(&options.root_dir.join(WAL_FILE_NAME), DEFAULT_BLOCK_SIZE)?;

        info!(
            root = %options.root_dir.display(),
            flush_limit = options.memtable_flush_limit,
            "engine opened"
        );
        Ok(Self {
            root_dir: options.root_dir,
            memtable,
            wal,
        })
    }

    /// Store a key/value pair: log first, then make it visible.
    ///
    /// If the memtable rejects the pair (duplicate key) the event is
    /// already in the log; replay re-applies it, which is harmless for an
    /// insert that loses to the same key.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let event = Event::Write { key, value };
        self.wal.append(&event.encode())?;
        self.memtable.insert(key, value)?;
        debug!(key = %short_hex(key), value_len = value.len(), "put");
        Ok(())
    }

    /// Borrowed view of the value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.memtable.get(key)
    }

    /// Delete a key: log first, then drop it from the memtable.
    pub fn remove(&mut self, key: &[u8]) -> EngineResult<()> {
        let event = Event::Delete { key };
        self.wal.append(&event.encode())?;
        self.memtable.remove(key)?;
        debug!(key = %short_hex(key), "delete");
        Ok(())
    }

    /// Number of entries in the live memtable.
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    /// Returns `true` if the live memtable is empty.
    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Force logged bytes to stable storage.
    pub fn flush(&mut self) -> EngineResult<()> {
        self.wal.flush()?;
        Ok(())
    }

    /// Shut down cleanly: one final durability barrier, then release the
    /// log and directory handles.
    pub fn close(mut self) -> EngineResult<()> {
        self.wal.flush()?;
        info!(root = %self.root_dir.display(), "engine closed");
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Engines dropped without close() still get a best-effort sync.
        let _ = self.wal.flush();
    }
}

/// First eight key bytes as hex, for log fields.
fn short_hex(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(8)])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use silt_index::IndexError;
    use silt_wal::{decode_block, RecordType};

    use super::*;
    use crate::error::EngineError;

    fn open_temp_engine(flush_limit: usize) -> (tempfile::TempDir, Engine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::open(EngineOptions {
            root_dir: dir.path().join("db"),
            memtable_flush_limit: flush_limit,
        })
        .unwrap();
        (dir, engine)
    }

    fn wal_events(root: &std::path::Path) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        let bytes = fs::read(root.join(WAL_FILE_NAME)).unwrap();
        let mut events = Vec::new();
        for block in bytes.chunks(DEFAULT_BLOCK_SIZE) {
            for record in decode_block(block).unwrap() {
                assert_eq!(record.rtype, RecordType::Full);
                match Event::decode(&record.data).unwrap() {
                    Event::Write { key, value } => {
                        events.push((key.to_vec(), Some(value.to_vec())));
                    }
                    Event::Delete { key } => events.push((key.to_vec(), None)),
                }
            }
        }
        events
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn open_creates_the_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("db");
        assert!(!root.exists());

        let engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();
        assert!(root.join(WAL_FILE_NAME).exists());
        engine.close().unwrap();
    }

    #[test]
    fn reopening_an_existing_root_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let options = EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        };

        let mut engine = Engine::open(options.clone()).unwrap();
        engine.put(b"k", b"v").unwrap();
        engine.close().unwrap();

        // Second open sees the same directory and appends to the same log.
        let mut engine = Engine::open(options).unwrap();
        engine.put(b"k2", b"v2").unwrap();
        engine.close().unwrap();

        let events = wal_events(&root);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (b"k".to_vec(), Some(b"v".to_vec())));
        assert_eq!(events[1], (b"k2".to_vec(), Some(b"v2".to_vec())));
    }

    // -----------------------------------------------------------------------
    // Read/write path
    // -----------------------------------------------------------------------

    #[test]
    fn put_then_get_round_trip() {
        let (_dir, mut engine) = open_temp_engine(16);
        engine.put(b"k", b"v").unwrap();
        assert_eq!(engine.get(b"k"), Some(&b"v"[..]));
        assert_eq!(engine.get(b"missing"), None);
    }

    #[test]
    fn remove_makes_a_key_unreadable() {
        let (_dir, mut engine) = open_temp_engine(16);
        engine.put(b"k", b"v").unwrap();
        engine.remove(b"k").unwrap();
        assert_eq!(engine.get(b"k"), None);
    }

    #[test]
    fn put_is_logged_before_it_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let mut engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();

        engine.put(b"k", b"v").unwrap();
        assert_eq!(engine.get(b"k"), Some(&b"v"[..]));

        // The serialized write event is already on disk (page cache) and
        // decodes from block 0 as the first record.
        let events = wal_events(&root);
        assert_eq!(events, vec![(b"k".to_vec(), Some(b"v".to_vec()))]);
    }

    #[test]
    fn rejected_duplicate_still_reaches_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let mut engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();

        engine.put(b"k", b"v1").unwrap();
        assert!(matches!(
            engine.put(b"k", b"v2"),
            Err(EngineError::Index(IndexError::AlreadyExists))
        ));
        assert_eq!(engine.get(b"k"), Some(&b"v1"[..]));

        // Both events were appended; replay decides what wins.
        assert_eq!(wal_events(&root).len(), 2);
    }

    #[test]
    fn remove_of_missing_key_still_reaches_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let mut engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();

        assert!(matches!(
            engine.remove(b"ghost"),
            Err(EngineError::Index(IndexError::NotFound))
        ));
        let events = wal_events(&root);
        assert_eq!(events, vec![(b"ghost".to_vec(), None)]);
    }

    #[test]
    fn deletes_are_logged_as_delete_events() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let mut engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();

        engine.put(b"a", b"1").unwrap();
        engine.remove(b"a").unwrap();

        let events = wal_events(&root);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], (b"a".to_vec(), None));
    }

    #[test]
    fn memtable_freeze_empties_the_live_view() {
        let (_dir, mut engine) = open_temp_engine(2);
        engine.put(b"a", b"1").unwrap();
        engine.put(b"b", b"2").unwrap();
        engine.put(b"c", b"3").unwrap(); // triggers the freeze

        assert!(engine.is_empty());
        assert_eq!(engine.get(b"a"), None);
        assert_eq!(engine.get(b"c"), None);
        assert_eq!(engine.len(), 0);
    }

    #[test]
    fn large_values_survive_chunked_logging() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("db");
        let mut engine = Engine::open(EngineOptions {
            root_dir: root.clone(),
            memtable_flush_limit: 16,
        })
        .unwrap();

        // One event bigger than a block: its record run is First..Last.
        let value = vec![0x42u8; DEFAULT_BLOCK_SIZE + 100];
        engine.put(b"big", &value).unwrap();
        assert_eq!(engine.get(b"big"), Some(value.as_slice()));

        let bytes = fs::read(root.join(WAL_FILE_NAME)).unwrap();
        let mut payload = Vec::new();
        for block in bytes.chunks(DEFAULT_BLOCK_SIZE) {
            for record in decode_block(block).unwrap() {
                payload.extend_from_slice(&record.data);
            }
        }
        match Event::decode(&payload).unwrap() {
            Event::Write { key, value: logged } => {
                assert_eq!(key, b"big");
                assert_eq!(logged, value.as_slice());
            }
            other => panic!("unexpected event {other}"),
        }
    }

    // -----------------------------------------------------------------------
    // Quantified invariants
    // -----------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Durability ordering: after every operation, the log already
        /// holds one event per attempted put/remove, in issue order,
        /// whatever the memtable decided (accepted, duplicate, missing key,
        /// or frozen away).
        #[test]
        fn every_operation_is_logged_before_it_is_visible(
            ops in proptest::collection::vec(
                (
                    any::<bool>(),
                    proptest::collection::vec(any::<u8>(), 0..4),
                    proptest::collection::vec(any::<u8>(), 0..4),
                ),
                1..24,
            ),
            flush_limit in 1usize..8,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("db");
            let mut engine = Engine::open(EngineOptions {
                root_dir: root.clone(),
                memtable_flush_limit: flush_limit,
            })
            .unwrap();

            let mut expected = Vec::new();
            for (is_put, key, value) in &ops {
                if *is_put {
                    let _ = engine.put(key, value);
                    expected.push((key.clone(), Some(value.clone())));
                } else {
                    let _ = engine.remove(key);
                    expected.push((key.clone(), None));
                }
                prop_assert_eq!(&wal_events(&root), &expected);
            }

            // Anything visible in the memtable is backed by a logged write.
            for (_, key, _) in &ops {
                if engine.get(key).is_some() {
                    prop_assert!(expected
                        .iter()
                        .any(|(k, v)| k == key && v.is_some()));
                }
            }
        }
    }
}
