//! Cache layer
//!
//! In-process TTL cache (moka). Used for the resolved media listing when
//! `storage.listing_cache_ttl_seconds` is non-zero.

pub mod memory;

pub use memory::MemoryCache;
