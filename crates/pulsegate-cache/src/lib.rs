//! # pulsegate-cache
//!
//! In-process caches for PulseGate:
//!
//! - [`TtlCache`]: a size-bounded map whose entries go stale after a fixed
//!   TTL. Stale entries are dropped lazily on read; when the cache is full
//!   the oldest half is evicted before a new key is inserted.
//! - [`TokenValidationCache`]: the gate's token → verdict cache built on it.
//!
//! Entries live in process memory only and are never persisted.
//! Timestamps come from the tokio clock, so a paused test runtime can
//! advance time deterministically.

pub mod memory;
pub mod token;

pub use memory::TtlCache;
pub use token::TokenValidationCache;
