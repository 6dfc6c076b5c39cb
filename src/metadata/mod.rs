//! Instance metadata access.
//!
//! # Data Flow
//! ```text
//! fetch(path):
//!     → PUT /latest/api/token (cached until shortly before expiry)
//!     → GET /latest/meta-data/<path> with session token
//!     → 200: Present(body) | 404: Absent | anything else: TransientError
//! ```

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ImdsClient, MetadataClient};
pub use types::{MetadataError, RawMetadataResult};
