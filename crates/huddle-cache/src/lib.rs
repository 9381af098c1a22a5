//! # huddle-cache
//!
//! Generic TTL cache with in-flight request de-duplication, used for
//! remote per-entity lookups. A burst of concurrent lookups for
//! overlapping keys collapses into at most one round trip per distinct
//! uncached key.
//!
//! This is a reusable primitive, not tied to any one lookup's semantics.

pub mod coalescing;

pub use coalescing::CoalescingCache;
