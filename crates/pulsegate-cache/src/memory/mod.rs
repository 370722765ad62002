//! Generic in-memory TTL cache.

pub mod store;

pub use store::TtlCache;
