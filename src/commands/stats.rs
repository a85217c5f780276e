use crate::quiz::TopOrder;
use crate::state::Context;

use super::{actor, send};

/// Your quiz statistics
#[poise::command(slash_command)]
pub async fn stats(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.stats(&actor(&ctx)).await;
    send(&ctx, replies).await
}

/// Top 10 players
#[poise::command(slash_command)]
pub async fn top(
    ctx: Context<'_>,
    #[description = "rating, accuracy or questions (default rating)"] order: Option<String>,
) -> Result<(), anyhow::Error> {
    let order = match order {
        Some(order) => order.parse()?,
        None => TopOrder::Rating,
    };
    let replies = ctx.data().bot.top(order).await;
    send(&ctx, replies).await
}

/// Your achievements
#[poise::command(slash_command)]
pub async fn achievements(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.achievements(&actor(&ctx)).await;
    send(&ctx, replies).await
}

/// Leaderboard of this channel
#[poise::command(slash_command)]
pub async fn groupstats(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.group_stats(&actor(&ctx)).await;
    send(&ctx, replies).await
}
