//! In-memory LRU in front of a result store.
//!
//! Keeps recently served score records in memory so repeated lookups for
//! popular restaurants do not hit the database. Writes go through to the
//! wrapped store before the LRU is updated.

mod front;

pub use front::{CacheStats, CachedResultStore};
