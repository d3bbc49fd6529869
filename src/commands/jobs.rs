use tracing::info;

use super::render::{describe_error, render_poll};
use super::{send_all, send_ephemeral};
use crate::remote::DispatchRequest;
use crate::state::Context;

/// Dispatch the remote batch job
#[poise::command(slash_command)]
pub async fn submit(
    ctx: Context<'_>,
    #[description = "Repository owner"] owner: String,
    #[description = "Repository name"] repo: String,
    #[description = "Job (dispatch event type)"] job: String,
    #[description = "API token"] token: String,
    #[description = "Code URL"] code_url: String,
    #[description = "Dataset URL"] dataset_url: String,
) -> Result<(), anyhow::Error> {
    // Ephemeral so the token never lands in channel history.
    ctx.defer_ephemeral().await?;

    let request = DispatchRequest {
        owner,
        repo,
        job,
        token,
        code_url,
        dataset_url,
    };
    info!(user = ctx.author().name, ?request, "job dispatch requested");

    let message = match ctx.data().remote.dispatch(&request).await {
        Ok(()) => format!(
            "Job `{}` dispatched to {}/{}.",
            request.job, request.owner, request.repo
        ),
        Err(e) => format!("Job dispatch failed: {}", describe_error(&e)),
    };

    send_ephemeral(&ctx, &[message]).await
}

/// Fetch job results from a URL
#[poise::command(slash_command)]
pub async fn results(
    ctx: Context<'_>,
    #[description = "Results URL"] url: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    match ctx.data().remote.poll(&url).await {
        Ok(outcome) => send_all(&ctx, &render_poll(&outcome)).await,
        Err(e) => {
            let message = format!("Error fetching results: {}", describe_error(&e));
            send_all(&ctx, &[message]).await
        }
    }
}
