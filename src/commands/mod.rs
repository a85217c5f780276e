mod play;
mod stats;

use crate::bot::{Actor, Reply};
use crate::handlers::{action_rows, actor_for};
use crate::state::{AppState, Context};

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<AppState, anyhow::Error>> {
    vec![
        play::start(),
        play::question(),
        play::difficulty(),
        play::help(),
        stats::stats(),
        stats::top(),
        stats::achievements(),
        stats::groupstats(),
    ]
}

fn actor(ctx: &Context<'_>) -> Actor {
    actor_for(
        ctx.author(),
        ctx.channel_id(),
        ctx.guild_id(),
        &ctx.serenity_context().cache,
    )
}

/// Send replies through the interaction, chunked to Discord's size limit.
async fn send(ctx: &Context<'_>, replies: Vec<Reply>) -> Result<(), anyhow::Error> {
    for reply in replies.into_iter().flat_map(Reply::into_chunks) {
        let mut builder = poise::CreateReply::default().content(reply.text);
        if !reply.buttons.is_empty() {
            builder = builder.components(action_rows(&reply.buttons));
        }
        ctx.send(builder).await?;
    }
    Ok(())
}
