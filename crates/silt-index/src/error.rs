/// Errors produced by the in-memory index structures.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// An equal key is already present. The stored value is left untouched.
    #[error("key already exists")]
    AlreadyExists,

    /// The key is not present in the index.
    #[error("key not found")]
    NotFound,

    /// Bloom filter bit size must be a non-zero multiple of 64.
    #[error("bloom filter size {bits} is not a non-zero multiple of 64")]
    InvalidSize { bits: usize },
}

/// Convenience alias used throughout the index crate.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
