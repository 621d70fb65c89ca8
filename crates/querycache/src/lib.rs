//! # querycache
//!
//! TTL memoization cache for expensive, argument-keyed queries.
//!
//! ## Architecture
//! - **Fingerprinting**: MD5 over each argument's type tag and textual value
//! - **Entry store**: `parking_lot::RwLock` over an AHash map, shared with the sweeper
//! - **Sweeper**: background tokio task purging aged entries every TTL interval
//!
//! On a miss the caller-supplied query runs, its result is stored with an
//! absolute deadline of now + TTL, and later calls with the same arguments
//! return the stored value until the deadline passes.

#![warn(missing_docs)]

mod cache;
mod entity;
mod error;
mod fingerprint;
mod stats;

pub use cache::QueryCache;
pub use error::{Error, QueryError, Result};
pub use fingerprint::{fingerprint, QueryArg};
pub use stats::CacheStats;
pub use tokio_util::sync::CancellationToken;
