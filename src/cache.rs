use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::dataset::Record;
use crate::error::Result;

/// Time source for entry expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used by tests.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(source: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            query: query.into(),
        }
    }
}

struct CacheEntry {
    rows: Arc<Vec<Record>>,
    fetched_at: Instant,
}

/// Result of a cached read.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub rows: Arc<Vec<Record>>,
    /// Whether the rows came from the cache rather than a fresh fetch.
    pub hit: bool,
    pub age: Duration,
}

/// Memoized query results with one TTL for every entry.
///
/// Entries older than the TTL are refetched on read. Failed fetches are
/// never stored and only evict an entry that is still stale. Concurrent
/// misses on the same key may both fetch; the later store wins.
pub struct QueryCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl QueryCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> QueryCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Cached rows for `key`, running `fetch` when absent or stale.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Lookup>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                let age = self.clock.now().saturating_duration_since(entry.fetched_at);
                if age < self.ttl {
                    debug!(source = %key.source, query = %key.query, age_secs = age.as_secs(), "cache hit");
                    return Ok(Lookup {
                        rows: entry.rows.clone(),
                        hit: true,
                        age,
                    });
                }
            }
        }

        debug!(source = %key.source, query = %key.query, "cache miss, fetching");
        let rows = match fetch().await {
            Ok(rows) => Arc::new(rows),
            Err(e) => {
                // Drop a stale entry so the next read retries the source. A
                // fresh one was stored by a concurrent fetch and stays.
                let mut entries = self.entries.write().await;
                let now = self.clock.now();
                if entries
                    .get(key)
                    .is_some_and(|entry| now.saturating_duration_since(entry.fetched_at) >= self.ttl)
                {
                    entries.remove(key);
                }
                return Err(e);
            }
        };

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            CacheEntry {
                rows: rows.clone(),
                fetched_at: self.clock.now(),
            },
        );
        Ok(Lookup {
            rows,
            hit: false,
            age: Duration::ZERO,
        })
    }

    /// Drop every entry regardless of age. Returns how many were dropped.
    pub async fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "cache invalidated");
        dropped
    }

    /// Number of entries still within the TTL.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
