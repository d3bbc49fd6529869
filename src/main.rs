use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info, warn, Level};

use autos_console::cache::QueryCache;
use autos_console::commands;
use autos_console::config::DashboardSettings;
use autos_console::remote::RemoteClient;
use autos_console::sources::{LiveSource, MongoSource, PostgresSource};
use autos_console::state::AppState;

const POSTGRES_QUERY: &str = "SELECT * FROM autos;";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let settings = DashboardSettings::from_env()?;
    let guild_id = settings.guild_id.map(serenity::GuildId::new);

    // Database clients. A missing database is reported per command, not fatal.
    let mongo: Option<Arc<dyn LiveSource>> = match MongoSource::connect(
        &settings.mongo_uri,
        &settings.mongo_database,
        &settings.mongo_collection,
        settings.http_timeout,
    )
    .await
    {
        Ok(source) => {
            info!(database = %settings.mongo_database, collection = %settings.mongo_collection, "MongoDB source configured");
            Some(Arc::new(source))
        }
        Err(e) => {
            error!("Error configuring MongoDB: {}", e);
            None
        }
    };

    let postgres: Option<Arc<dyn LiveSource>> = match settings.database_url.as_deref() {
        Some(url) => match PostgresSource::connect_lazy(url, POSTGRES_QUERY, settings.http_timeout) {
            Ok(source) => {
                info!("PostgreSQL source configured");
                Some(Arc::new(source))
            }
            Err(e) => {
                error!("Error configuring PostgreSQL: {}", e);
                None
            }
        },
        None => {
            warn!("DATABASE_URL not set, PostgreSQL unavailable");
            None
        }
    };

    let remote = RemoteClient::new(&settings.dispatch_api_base, settings.http_timeout)?;
    info!(api = %settings.dispatch_api_base, timeout_secs = settings.http_timeout.as_secs(), "HTTP client initialized");

    let app_state = AppState {
        cache: QueryCache::new(settings.cache_ttl),
        mongo,
        postgres,
        remote,
        mongo_upload_url: settings.mongo_upload_url.clone(),
        pgsql_upload_url: settings.pgsql_upload_url.clone(),
    };
    info!(ttl_secs = app_state.cache.ttl().as_secs(), "Query cache ready");

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::autos()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, gid)
                        .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting autos console...");

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
