use crate::error::{WalError, WalResult};

const WRITE_TAG: u8 = 1;
const DELETE_TAG: u8 = 2;

/// A single logical mutation, as persisted in the log.
///
/// On-disk format, little-endian:
/// ```text
/// write:  0x01 [4 bytes: key length] [key] [4 bytes: value length] [value]
/// delete: 0x02 [4 bytes: key length] [key]
/// ```
///
/// Events carry no checksum of their own; integrity is the record layer's
/// job. Decoding borrows from the input buffer, so replay can hand out
/// views without copying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// A key/value write.
    Write { key: &'a [u8], value: &'a [u8] },
    /// A key deletion.
    Delete { key: &'a [u8] },
}

impl<'a> Event<'a> {
    /// Serialized length of this event in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Event::Write { key, value } => 1 + 4 + key.len() + 4 + value.len(),
            Event::Delete { key } => 1 + 4 + key.len(),
        }
    }

    /// Serialize to the wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        match self {
            Event::Write { key, value } => {
                buf.push(WRITE_TAG);
                put_field(&mut buf, key);
                put_field(&mut buf, value);
            }
            Event::Delete { key } => {
                buf.push(DELETE_TAG);
                put_field(&mut buf, key);
            }
        }
        buf
    }

    /// Deserialize an event, borrowing key and value from `buf`.
    ///
    /// Fails with [`WalError::InvalidEvent`] on an unknown tag or a buffer
    /// that ends before a declared field length; `tag` carries the tag byte
    /// seen (0 for an empty buffer).
    pub fn decode(buf: &'a [u8]) -> WalResult<Self> {
        let (&tag, body) = buf
            .split_first()
            .ok_or(WalError::InvalidEvent { tag: 0 })?;
        match tag {
            WRITE_TAG => {
                let (key, rest) = take_field(body).ok_or(WalError::InvalidEvent { tag })?;
                let (value, _) = take_field(rest).ok_or(WalError::InvalidEvent { tag })?;
                Ok(Event::Write { key, value })
            }
            DELETE_TAG => {
                let (key, _) = take_field(body).ok_or(WalError::InvalidEvent { tag })?;
                Ok(Event::Delete { key })
            }
            tag => Err(WalError::InvalidEvent { tag }),
        }
    }
}

impl std::fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Write { key, value } => {
                write!(f, "write({} key bytes, {} value bytes)", key.len(), value.len())
            }
            Event::Delete { key } => write!(f, "delete({} key bytes)", key.len()),
        }
    }
}

fn put_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
    buf.extend_from_slice(field);
}

/// Read one `u32`-length-prefixed field from the front of `buf`, returning
/// the field and the remainder, or `None` if the buffer is too short.
fn take_field(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    if buf.len() < 4 {
        return None;
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if buf.len() < 4 + len {
        return None;
    }
    Some((&buf[4..4 + len], &buf[4 + len..]))
}
