use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

/// Settings for the offline export job.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub dataset: PathBuf,
    pub results_dir: PathBuf,
    pub partitions: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("autos.csv"),
            results_dir: PathBuf::from("results"),
            partitions: 1,
        }
    }
}

impl ExportSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dataset: dotenv::var("AUTOS_DATASET")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset),
            results_dir: dotenv::var("AUTOS_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            partitions: parse_var("AUTOS_PARTITIONS", defaults.partitions).max(1),
        }
    }
}

/// Settings for the operator console. Not `Debug`: it holds the bot token.
#[derive(Clone)]
pub struct DashboardSettings {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub database_url: Option<String>,
    pub cache_ttl: Duration,
    pub http_timeout: Duration,
    pub dispatch_api_base: String,
    pub mongo_upload_url: Option<String>,
    pub pgsql_upload_url: Option<String>,
}

impl DashboardSettings {
    pub fn from_env() -> Result<Self> {
        let discord_token = dotenv::var("DISCORD_TOKEN").context("DISCORD_TOKEN required")?;

        Ok(Self {
            discord_token,
            guild_id: dotenv::var("DISCORD_GUILD_ID")
                .ok()
                .and_then(|s| s.parse::<u64>().ok()),
            mongo_uri: dotenv::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_database: dotenv::var("MONGO_DATABASE").unwrap_or_else(|_| "autos".to_string()),
            mongo_collection: dotenv::var("MONGO_COLLECTION")
                .unwrap_or_else(|_| "autos".to_string()),
            database_url: optional_var("DATABASE_URL"),
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", 600)),
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 30)),
            dispatch_api_base: dotenv::var("DISPATCH_API_BASE")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            mongo_upload_url: optional_var("MONGO_UPLOAD_URL"),
            pgsql_upload_url: optional_var("PGSQL_UPLOAD_URL"),
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    dotenv::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match dotenv::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(key, value = raw, %default, "invalid numeric setting, using default");
            default
        }
    }
}
