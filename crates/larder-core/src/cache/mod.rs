//! In-memory caching for screen data.
//!
//! - `TtlCache`: generic key/value store with a single time-to-live
//! - `CacheKey`: resource plus owning account, the only key type screens use
//! - `CacheManager`: typed accessors over one shared `TtlCache`
//!
//! Nothing is written to disk; the remote API stays the source of truth and
//! cached entries simply age out (three minutes by default).

pub mod key;
pub mod manager;
pub mod ttl;

pub use key::{CacheKey, Resource};
pub use manager::{CacheAges, CacheManager, CachedPayload};
pub use ttl::{CacheEntry, TtlCache};
