use crate::quiz::difficulty::DifficultyPreference;
use crate::state::Context;

use super::{actor, send};

/// Register and show the main menu
#[poise::command(slash_command)]
pub async fn start(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.start(&actor(&ctx)).await;
    send(&ctx, replies).await
}

/// Get a new question
#[poise::command(slash_command)]
pub async fn question(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.ask_question(&actor(&ctx)).await;
    send(&ctx, replies).await
}

/// Choose question difficulty
#[poise::command(slash_command)]
pub async fn difficulty(
    ctx: Context<'_>,
    #[description = "all, easy, medium or hard (omit to open the menu)"] level: Option<String>,
) -> Result<(), anyhow::Error> {
    let bot = &ctx.data().bot;
    let actor = actor(&ctx);
    let replies = match level {
        Some(level) => {
            let pref: DifficultyPreference = level.parse()?;
            bot.set_difficulty(&actor, pref).await
        }
        None => bot.difficulty_menu(&actor).await,
    };
    send(&ctx, replies).await
}

/// How the quiz works
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let replies = ctx.data().bot.help().await;
    send(&ctx, replies).await
}
