//! Video metadata lookups against TikAPI, shielded by a time-bounded cache.

pub mod cache;
pub mod client;
pub mod error;

mod payload;

pub use cache::TtlCache;
pub use client::{MetadataClient, DEFAULT_CACHE_TTL};
pub use error::MetadataError;
