use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{WalError, WalResult};
use crate::record::{self, checksum_for, Record, HEADER_SIZE};

/// Default block size: 32 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Append-only write-ahead log of fixed-size blocks.
///
/// The file is a sequence of `block_size` regions, each holding whole
/// records followed by zero padding; a record never straddles a block
/// boundary. Payloads larger than one block are chunked into
/// `First`/`Middle`/`Last` records before placement. The write path leaves
/// appended bytes in the OS page cache; [`Wal::flush`] is the durability
/// barrier.
///
/// Placement is computed from the file's end on every append rather than a
/// cached cursor, so interleaved appends through the same handle stay
/// consistent as long as they are serialized.
pub struct Wal {
    path: PathBuf,
    file: File,
    block_size: usize,
}

impl Wal {
    /// Open (or create) the log file at `path`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is not strictly larger than the record
    /// header; no record could ever be placed in such a block.
    pub fn open(path: &Path, block_size: usize) -> WalResult<Self> {
        assert!(
            block_size > HEADER_SIZE,
            "block size {block_size} must exceed the {HEADER_SIZE}-byte record header"
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        debug!(path = %path.display(), block_size, len = file.metadata()?.len(), "wal opened");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            block_size,
        })
    }

    /// Append one logical payload, chunked into records and placed so that
    /// no record crosses a block boundary.
    ///
    /// On return the bytes have been handed to the OS; call [`Wal::flush`]
    /// for a durability barrier. `payload` must not be empty: a zero-length
    /// record would be indistinguishable from padding on replay.
    pub fn append(&mut self, payload: &[u8]) -> WalResult<()> {
        debug_assert!(!payload.is_empty());
        for record in record::chunk(payload, self.block_size) {
            self.append_record(&record)?;
        }
        Ok(())
    }

    /// Force appended bytes to stable storage.
    pub fn flush(&mut self) -> WalResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Current file length in bytes.
    pub fn len(&self) -> WalResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Configured block size in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the `index`-th block from the file and decode its records.
    ///
    /// The trailing block of the file may be shorter than `block_size`;
    /// whatever is present is decoded. Reading past the end of the file
    /// yields an empty record list.
    pub fn read_block(&mut self, index: u64) -> WalResult<Vec<Record>> {
        let mut buf = vec![0u8; self.block_size];
        self.file
            .seek(SeekFrom::Start(index * self.block_size as u64))?;
        let n = read_until_eof(&mut self.file, &mut buf)?;
        let records = decode_block(&buf[..n])?;
        debug!(block = index, records = records.len(), "wal block read");
        Ok(records)
    }

    fn append_record(&mut self, record: &Record) -> WalResult<()> {
        let end = self.file.seek(SeekFrom::End(0))?;
        let space = self.block_size - (end as usize % self.block_size);
        let padded = record.encoded_len() > space;
        if padded {
            // Pad out the current block; the record starts a fresh one.
            self.file.write_all(&vec![0u8; space])?;
        }
        self.file.write_all(&record.encode())?;
        debug!(offset = end, len = record.encoded_len(), padded, "wal record appended");
        Ok(())
    }
}

/// Decode the records of one block.
///
/// Records are read back-to-back from offset 0. A header that fails
/// validation is the padding sentinel: the block ends there and the records
/// accumulated so far are returned. A record whose stored CRC does not
/// match its contents aborts replay of the block with
/// [`WalError::ChecksumMismatch`].
pub fn decode_block(buf: &[u8]) -> WalResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    while offset + HEADER_SIZE <= buf.len() {
        let record = match Record::decode_at(&buf[offset..], offset as u64) {
            Ok(record) => record,
            Err(WalError::InvalidRecord { .. }) => break,
            Err(e) => return Err(e),
        };
        let actual = checksum_for(record.rtype, &record.data);
        if record.checksum != actual {
            return Err(WalError::ChecksumMismatch {
                offset: offset as u64,
                expected: record.checksum,
                actual,
            });
        }
        offset += record.encoded_len();
        records.push(record);
    }
    Ok(records)
}

/// Fill `buf` from `reader`, stopping early at end-of-file. Returns the
/// number of bytes read.
fn read_until_eof(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
