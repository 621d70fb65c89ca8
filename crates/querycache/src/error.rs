//! Error types for querycache

use std::fmt;

/// Boxed error produced by a caller-supplied query.
pub type QueryError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for querycache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug)]
pub enum Error {
    /// An argument could not be rendered for fingerprinting
    Digest,

    /// The caller-supplied query failed; nothing was cached
    Query(QueryError),

    /// A cached entry under this fingerprint holds a different payload type
    ValueType {
        /// Type the caller asked for
        expected: &'static str,
    },

    /// TTL must be non-zero
    InvalidTtl,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Digest => write!(f, "argument could not be rendered for fingerprinting"),
            Error::Query(e) => write!(f, "query failed: {}", e),
            Error::ValueType { expected } => {
                write!(f, "cached value does not have the requested type {}", expected)
            }
            Error::InvalidTtl => write!(f, "ttl must be non-zero"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Query(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
