use crate::error::{WalError, WalResult};

/// Record header size: 4-byte checksum, 2-byte length, 1-byte type.
pub const HEADER_SIZE: usize = 7;

/// Position of a record's payload within the whole logical entry.
///
/// A payload that fits a block is a single `Full` record; anything larger
/// is split into a `First` record, zero or more `Middle` records, and a
/// `Last` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    Full = 1,
    First = 2,
    Middle = 3,
    Last = 4,
}

impl RecordType {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Full),
            2 => Some(Self::First),
            3 => Some(Self::Middle),
            4 => Some(Self::Last),
            _ => None,
        }
    }
}

/// The framed unit stored in a block.
///
/// Wire format, little-endian:
/// ```text
/// [4 bytes: CRC32 of payload ++ type byte]
/// [2 bytes: payload length]
/// [1 byte:  record type]
/// [N bytes: payload]
/// ```
///
/// A zero-length record is unrepresentable on disk by construction of the
/// writer: block padding is all zeroes, and the reader relies on a zero
/// length field marking end-of-block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// CRC-32 over `payload ++ [type byte]`, as read from or written to disk.
    pub checksum: u32,
    /// Record type tag.
    pub rtype: RecordType,
    /// Payload bytes (a whole logical entry, or a chunk of one).
    pub data: Vec<u8>,
}

impl Record {
    /// Build a record, computing the checksum from the payload and type.
    pub fn new(rtype: RecordType, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= u16::MAX as usize);
        let checksum = checksum_for(rtype, &data);
        Self {
            checksum,
            rtype,
            data,
        }
    }

    /// Total encoded size, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.data.len()
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf.extend_from_slice(&(self.data.len() as u16).to_le_bytes());
        buf.push(self.rtype as u8);
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Deserialize one record from the front of `buf`.
    ///
    /// Fails with [`WalError::InvalidRecord`] on a zero length, an unknown
    /// type byte, or a buffer too short for the declared payload. The
    /// checksum is carried through unverified; the block reader checks it.
    pub fn decode(buf: &[u8]) -> WalResult<Self> {
        Self::decode_at(buf, 0)
    }

    /// [`Record::decode`], reporting failures at absolute offset `offset`
    /// (the position of `buf`'s first byte within the block or file).
    pub fn decode_at(buf: &[u8], offset: u64) -> WalResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(WalError::InvalidRecord { offset });
        }
        let checksum = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let length = u16::from_le_bytes([buf[4], buf[5]]) as usize;
        let rtype = RecordType::from_byte(buf[6]).ok_or(WalError::InvalidRecord { offset })?;
        if length == 0 || buf.len() < HEADER_SIZE + length {
            return Err(WalError::InvalidRecord { offset });
        }
        Ok(Self {
            checksum,
            rtype,
            data: buf[HEADER_SIZE..HEADER_SIZE + length].to_vec(),
        })
    }

    /// Returns `true` if the stored checksum matches the payload and type.
    pub fn verify_checksum(&self) -> bool {
        self.checksum == checksum_for(self.rtype, &self.data)
    }
}

/// CRC-32 over `data ++ [type byte]`.
pub(crate) fn checksum_for(rtype: RecordType, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.update(&[rtype as u8]);
    hasher.finalize()
}

/// Split a payload into records that each fit one `block_size` block.
///
/// A payload of at most `block_size - HEADER_SIZE` bytes becomes a single
/// `Full` record; larger payloads become a `First`/`Middle`.../`Last` run
/// whose final chunk is never empty.
pub fn chunk(payload: &[u8], block_size: usize) -> Vec<Record> {
    debug_assert!(block_size > HEADER_SIZE);
    let max_data = block_size - HEADER_SIZE;
    if payload.len() <= max_data {
        return vec![Record::new(RecordType::Full, payload.to_vec())];
    }

    let mut records = Vec::with_capacity(payload.len().div_ceil(max_data));
    let mut chunks = payload.chunks(max_data).peekable();
    let mut first = true;
    while let Some(data) = chunks.next() {
        let rtype = if first {
            RecordType::First
        } else if chunks.peek().is_some() {
            RecordType::Middle
        } else {
            RecordType::Last
        };
        first = false;
        records.push(Record::new(rtype, data.to_vec()));
    }
    records
}
