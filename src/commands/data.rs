use tracing::info;

use super::render::{describe_error, fenced_chunks, render_table, MESSAGE_LIMIT};
use super::send_all;
use crate::sources::read_cached;
use crate::state::{Context, Database};

/// Query MongoDB (cached)
#[poise::command(slash_command)]
pub async fn mongo(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    show(&ctx, Database::Mongo, false).await
}

/// Query PostgreSQL (cached)
#[poise::command(slash_command)]
pub async fn postgres(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    show(&ctx, Database::Postgres, false).await
}

/// Clear every cached query, then re-read a database
#[poise::command(slash_command)]
pub async fn refresh(
    ctx: Context<'_>,
    #[description = "Database to re-read"] database: Database,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let dropped = ctx.data().cache.invalidate_all().await;
    info!(user = ctx.author().name, dropped, "cache cleared");

    show(&ctx, database, true).await
}

/// Trigger the loader for a database
#[poise::command(slash_command)]
pub async fn upload(
    ctx: Context<'_>,
    #[description = "Database to load into"] database: Database,
) -> Result<(), anyhow::Error> {
    let Some(url) = ctx.data().upload_url(database) else {
        ctx.say(format!("No loader URL configured for {}.", database.label()))
            .await?;
        return Ok(());
    };
    ctx.defer().await?;

    info!(user = ctx.author().name, url, "loader trigger requested");
    let reply = match ctx.data().remote.trigger_load(url).await {
        Ok(body) if body.trim().is_empty() => vec![format!("POST sent to {} (empty response)", url)],
        Ok(body) => vec![format!("POST sent to {}\n**Response:**", url), body],
        Err(e) => vec![format!("Loader request to {} failed: {}", url, describe_error(&e))],
    };
    send_all(&ctx, &reply).await
}

async fn show(ctx: &Context<'_>, db: Database, refreshed: bool) -> Result<(), anyhow::Error> {
    let Some(source) = ctx.data().source(db) else {
        ctx.say(format!("{} connection not available.", db.label())).await?;
        return Ok(());
    };

    let lookup = match read_cached(&ctx.data().cache, source).await {
        Ok(lookup) => lookup,
        Err(e) => {
            let message = format!("Error querying {}: {}", db.label(), describe_error(&e));
            return send_all(ctx, &[message]).await;
        }
    };

    if lookup.rows.is_empty() {
        ctx.say(format!("{} returned no rows.", db.label())).await?;
        return Ok(());
    }

    let freshness = if lookup.hit {
        format!("cached {}s ago", lookup.age.as_secs())
    } else {
        "fresh".to_string()
    };
    let title = if refreshed { "Refreshed data from" } else { "Data from" };

    let mut reply = vec![format!(
        "**{} {}** | {} rows | {}",
        title,
        db.label(),
        lookup.rows.len(),
        freshness
    )];
    reply.extend(fenced_chunks("", &render_table(&lookup.rows), MESSAGE_LIMIT));
    send_all(ctx, &reply).await
}
