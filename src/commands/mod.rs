mod data;
mod jobs;
pub mod render;

use poise::CreateReply;

use crate::state::Context;

/// Autos - incident data console
#[poise::command(
    slash_command,
    subcommands(
        "data::mongo",
        "data::postgres",
        "data::refresh",
        "data::upload",
        "jobs::submit",
        "jobs::results"
    )
)]
pub async fn autos(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Send each piece as its own message. Follow-ups go through the
/// interaction webhook, so no channel send permission is needed.
async fn send_all<S: AsRef<str>>(ctx: &Context<'_>, pieces: &[S]) -> Result<(), anyhow::Error> {
    send_pieces(ctx, pieces, false).await
}

/// [`send_all`], visible only to the invoking user.
async fn send_ephemeral<S: AsRef<str>>(
    ctx: &Context<'_>,
    pieces: &[S],
) -> Result<(), anyhow::Error> {
    send_pieces(ctx, pieces, true).await
}

async fn send_pieces<S: AsRef<str>>(
    ctx: &Context<'_>,
    pieces: &[S],
    ephemeral: bool,
) -> Result<(), anyhow::Error> {
    for piece in pieces {
        for chunk in render::chunk(piece.as_ref(), render::MESSAGE_LIMIT) {
            ctx.send(CreateReply::default().content(chunk).ephemeral(ephemeral))
                .await?;
        }
    }
    Ok(())
}
