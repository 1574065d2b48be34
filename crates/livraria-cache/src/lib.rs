//! Process-local TTL cache.
//!
//! Best-effort only: losing entries never changes correctness, it only forces
//! a re-fetch. Constructed once at composition time and passed by reference to
//! whichever component needs it; there are no ambient singletons here.

mod ttl;

pub use ttl::{CacheStats, SweeperHandle, TtlCache};
