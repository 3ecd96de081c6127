use crate::error::{IndexError, IndexResult};

/// Fixed-size Bloom filter over byte-string keys.
///
/// Membership is probabilistic: `contains` can report false positives but
/// never false negatives. The bit array is packed into `u64` words, so the
/// size must be a non-zero multiple of 64. Probe positions are derived from
/// a single CRC-32 base hash plus a rotation delta per probe.
///
/// Standalone for now; intended for the future sorted-table reader to skip
/// tables that cannot contain a key.
#[derive(Clone, Debug)]
pub struct BloomFilter {
    words: Vec<u64>,
    bits: usize,
    hashes: u32,
}

impl BloomFilter {
    /// Create a filter with `bits` total bits and `hashes` probes per key.
    ///
    /// Fails with [`IndexError::InvalidSize`] unless `bits` is a non-zero
    /// multiple of 64.
    pub fn new(bits: usize, hashes: u32) -> IndexResult<Self> {
        if bits == 0 || bits % 64 != 0 {
            return Err(IndexError::InvalidSize { bits });
        }
        Ok(Self {
            words: vec![0; bits / 64],
            bits,
            hashes: hashes.max(1),
        })
    }

    /// Set the probe bits for `key`.
    pub fn insert(&mut self, key: &[u8]) {
        let (mut hash, delta) = probe_seed(key);
        for _ in 0..self.hashes {
            let bit = hash as usize % self.bits;
            self.words[bit / 64] |= 1u64 << (bit % 64);
            hash = hash.wrapping_add(delta);
        }
    }

    /// Test whether `key` may have been inserted.
    pub fn contains(&self, key: &[u8]) -> bool {
        let (mut hash, delta) = probe_seed(key);
        for _ in 0..self.hashes {
            let bit = hash as usize % self.bits;
            if self.words[bit / 64] & (1u64 << (bit % 64)) == 0 {
                return false;
            }
            hash = hash.wrapping_add(delta);
        }
        true
    }

    /// Total bits in the filter.
    pub fn bits(&self) -> usize {
        self.bits
    }
}

/// Base hash and per-probe delta for double hashing.
fn probe_seed(key: &[u8]) -> (u32, u32) {
    let hash = crc32fast::hash(key);
    (hash, hash.rotate_right(17) | 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sizes_not_multiple_of_64() {
        assert!(matches!(
            BloomFilter::new(100, 4),
            Err(IndexError::InvalidSize { bits: 100 })
        ));
        assert!(matches!(
            BloomFilter::new(0, 4),
            Err(IndexError::InvalidSize { bits: 0 })
        ));
        assert!(BloomFilter::new(64, 4).is_ok());
        assert!(BloomFilter::new(1024, 4).is_ok());
    }

    #[test]
    fn no_false_negatives() {
        let mut filter = BloomFilter::new(1024, 5).unwrap();
        let keys: Vec<Vec<u8>> = (0u8..64).map(|i| vec![i, i.wrapping_mul(7)]).collect();
        for key in &keys {
            filter.insert(key);
        }
        for key in &keys {
            assert!(filter.contains(key));
        }
    }

    #[test]
    fn empty_filter_contains_nothing() {
        let filter = BloomFilter::new(256, 4).unwrap();
        assert!(!filter.contains(b"anything"));
    }

    #[test]
    fn sparse_filter_rejects_most_absent_keys() {
        let mut filter = BloomFilter::new(4096, 5).unwrap();
        for i in 0u16..32 {
            filter.insert(&i.to_le_bytes());
        }
        let misses = (1000u16..2000)
            .filter(|i| !filter.contains(&i.to_le_bytes()))
            .count();
        // With 32 keys in 4096 bits the false-positive rate is far below 10%.
        assert!(misses > 900, "only {misses} of 1000 absent keys rejected");
    }
}
