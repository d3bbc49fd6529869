pub mod mongo;
pub mod postgres;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::cache::{CacheKey, Clock, Lookup, QueryCache};
use crate::dataset::Record;
use crate::error::Result;

pub use mongo::MongoSource;
pub use postgres::PostgresSource;

/// A database the console reads previously loaded rows from.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Stable name, also used as the cache namespace.
    fn id(&self) -> &str;

    /// Human-readable query this source runs.
    fn query(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Record>>;

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.id(), self.query())
    }
}

/// Read `source` through `cache`.
pub async fn read_cached<C: Clock>(cache: &QueryCache<C>, source: &dyn LiveSource) -> Result<Lookup> {
    let key = source.cache_key();
    let lookup = cache.get_or_fetch(&key, || source.fetch()).await;
    match &lookup {
        Ok(l) if !l.hit => info!(source = source.id(), rows = l.rows.len(), "fetched from source"),
        Ok(_) => {}
        Err(e) => warn!(source = source.id(), "source read failed: {}", e),
    }
    lookup
}
