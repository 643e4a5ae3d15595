//! Error types for Krill.

use thiserror::Error;

/// A specialized Result type for Krill.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error variants reported by builders and the dictionary loader.
///
/// Query-time misses are not errors; they are encoded in return values
/// (`Option` or [`LookupResult`](crate::LookupResult)).
#[derive(Debug, Error)]
pub enum Error {
    /// A builder received a key that is not strictly greater than the key
    /// added before it. The offending key is dropped; the builder stays
    /// usable.
    #[error("keys must be added in strictly increasing order")]
    UnsortedKeys,

    /// A persisted dictionary buffer does not decode to a whole structure.
    /// No partial structure is returned.
    #[error("malformed dictionary buffer: {0}")]
    Malformed(&'static str),
}
