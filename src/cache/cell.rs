use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// How long a cached value stays valid once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Never expires - the value is computed at most once per instance
    /// unless explicitly overridden.
    Infinite,
    /// Stale once this much time has passed since the value was computed.
    After(Duration),
}

/// TTL sentinel for values that never expire.
pub const INFINITE: Ttl = Ttl::Infinite;

impl Ttl {
    pub fn minutes(mins: i64) -> Self {
        Ttl::After(Duration::minutes(mins))
    }
}

/// A computed value together with the time it was computed.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub computed_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            computed_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.computed_at
    }

    pub fn is_stale(&self, ttl: Ttl) -> bool {
        match ttl {
            Ttl::Infinite => false,
            Ttl::After(window) => self.age() >= window,
        }
    }
}

/// A single memoized value with a time-to-live.
///
/// The slot is guarded by an async mutex held across the compute, so the
/// compute-then-store sequence is atomic: a concurrent reader waits for the
/// in-flight computation instead of racing a duplicate one.
pub struct TtlCell<T> {
    ttl: Ttl,
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCell<T> {
    /// An empty cell; the first read computes.
    pub fn new(ttl: Ttl) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// A cell already holding `value`, as if it had just been computed.
    pub fn preloaded(ttl: Ttl, value: T) -> Self {
        Self {
            ttl,
            slot: Mutex::new(Some(CacheEntry::new(value))),
        }
    }

    /// Return the cached value if present and fresh; otherwise run `compute`,
    /// store its result, and return it.
    ///
    /// A failed compute stores nothing - the error propagates and the next
    /// read re-attempts.
    pub async fn get_or_try_fill<F, Fut>(&self, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if !entry.is_stale(self.ttl) {
                return Ok(entry.value.clone());
            }
        }
        let value = compute().await?;
        *slot = Some(CacheEntry::new(value.clone()));
        Ok(value)
    }

    /// Manual override: insert `value` directly, bypassing any computation.
    /// Used by the aggregator to pre-populate derived fields on freshly
    /// constructed sub-entities without triggering their own fetch.
    pub async fn store(&self, value: T) {
        let mut slot = self.slot.lock().await;
        *slot = Some(CacheEntry::new(value));
    }

    /// The cached value if present and fresh; never computes.
    pub async fn peek(&self) -> Option<T> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|entry| !entry.is_stale(self.ttl))
            .map(|entry| entry.value.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
