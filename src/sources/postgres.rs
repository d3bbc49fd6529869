use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::debug;

use super::LiveSource;
use crate::dataset::Record;
use crate::error::Result;

/// A relational query whose rows come back as JSON objects.
pub struct PostgresSource {
    pool: PgPool,
    query: String,
}

impl PostgresSource {
    /// Lazily connected pool; the first fetch opens the connection.
    pub fn connect_lazy(database_url: &str, query: &str, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(timeout)
            .connect_lazy(database_url)?;
        debug!(query, "postgres pool configured");
        Ok(Self {
            pool,
            query: query.to_string(),
        })
    }
}

/// Wrap `query` so Postgres serializes each row, column order included.
fn as_json_rows(query: &str) -> String {
    let inner = query.trim().trim_end_matches(';').trim_end();
    format!("SELECT row_to_json(q) FROM ({}) AS q", inner)
}

#[async_trait]
impl LiveSource for PostgresSource {
    fn id(&self) -> &str {
        "postgres"
    }

    fn query(&self) -> &str {
        &self.query
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let rows: Vec<Json<Record>> = sqlx::query_scalar(&as_json_rows(&self.query))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(r)| r).collect())
    }
}
