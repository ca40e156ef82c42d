//! Per-instance memoization for lazily fetched entity fields.
//!
//! Every remotely derived property on an entity is backed by a [`TtlCell`]:
//! a single-value store holding the computed value and the time it was
//! computed. A read within the TTL window returns the stored value; a first
//! read, or a read after the window, runs the supplied computation and
//! stores the result. Caches live and die with the owning entity instance;
//! there is no cross-instance or process-wide sharing.

pub mod cell;

pub use cell::{CacheEntry, Ttl, TtlCell, INFINITE};
