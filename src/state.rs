use std::sync::Arc;

use crate::cache::QueryCache;
use crate::remote::RemoteClient;
use crate::sources::LiveSource;

/// Database a console action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Database {
    #[name = "MongoDB"]
    Mongo,
    #[name = "PostgreSQL"]
    Postgres,
}

impl Database {
    pub fn label(self) -> &'static str {
        match self {
            Database::Mongo => "MongoDB",
            Database::Postgres => "PostgreSQL",
        }
    }
}

pub struct AppState {
    pub cache: QueryCache,
    /// `None` when the client could not be configured at startup.
    pub mongo: Option<Arc<dyn LiveSource>>,
    pub postgres: Option<Arc<dyn LiveSource>>,
    pub remote: RemoteClient,
    pub mongo_upload_url: Option<String>,
    pub pgsql_upload_url: Option<String>,
}

impl AppState {
    pub fn source(&self, db: Database) -> Option<&dyn LiveSource> {
        match db {
            Database::Mongo => self.mongo.as_deref(),
            Database::Postgres => self.postgres.as_deref(),
        }
    }

    pub fn upload_url(&self, db: Database) -> Option<&str> {
        match db {
            Database::Mongo => self.mongo_upload_url.as_deref(),
            Database::Postgres => self.pgsql_upload_url.as_deref(),
        }
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
