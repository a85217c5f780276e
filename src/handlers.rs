//! Discord events that are not slash commands: button clicks, chat messages,
//! and messages produced by question timers.

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::bot::{Action, Actor, Bot, Button, Reply};
use crate::quiz::{ChatRef, Profile};
use crate::session::TimerEvent;
use crate::state::AppState;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, AppState, anyhow::Error>,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    match event {
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            let Some(action) = Action::parse(&component.data.custom_id) else {
                debug!(custom_id = %component.data.custom_id, "Ignoring unknown button");
                return Ok(());
            };
            component
                .create_response(ctx, serenity::CreateInteractionResponse::Acknowledge)
                .await?;

            let actor = actor_for(
                &component.user,
                component.channel_id,
                component.guild_id,
                &ctx.cache,
            );
            let replies = data.bot.handle(&actor, action).await;
            for reply in replies.into_iter().flat_map(Reply::into_chunks) {
                let mut followup =
                    serenity::CreateInteractionResponseFollowup::new().content(reply.text);
                if !reply.buttons.is_empty() {
                    followup = followup.components(action_rows(&reply.buttons));
                }
                component.create_followup(ctx, followup).await?;
            }
        }
        serenity::FullEvent::Message { new_message } => {
            if new_message.author.bot || new_message.content.trim().is_empty() {
                return Ok(());
            }
            let actor = actor_for(
                &new_message.author,
                new_message.channel_id,
                new_message.guild_id,
                &ctx.cache,
            );
            let mentions_bot = new_message.mentions_user_id(framework.bot_id);
            let replies = data
                .bot
                .on_text(&actor, &new_message.content, mentions_bot)
                .await;
            send_to_channel(&ctx.http, new_message.channel_id, replies).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Deliver timer messages until the session table is dropped.
pub async fn dispatch_timers(
    http: Arc<serenity::Http>,
    bot: Arc<Bot>,
    mut events: mpsc::UnboundedReceiver<TimerEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(delivery) = bot.on_timer(event).await else {
            continue;
        };
        let channel = serenity::ChannelId::new(delivery.chat.id);
        if let Err(e) = send_to_channel(&http, channel, delivery.replies).await {
            error!(channel_id = delivery.chat.id, "Failed to deliver timer message: {:#}", e);
        }
    }
    warn!("Timer channel closed");
}

async fn send_to_channel(
    http: &serenity::Http,
    channel: serenity::ChannelId,
    replies: Vec<Reply>,
) -> Result<(), anyhow::Error> {
    for reply in replies.into_iter().flat_map(Reply::into_chunks) {
        let mut message = serenity::CreateMessage::new().content(reply.text);
        if !reply.buttons.is_empty() {
            message = message.components(action_rows(&reply.buttons));
        }
        channel.send_message(http, message).await?;
    }
    Ok(())
}

pub(crate) fn action_rows(rows: &[Vec<Button>]) -> Vec<serenity::CreateActionRow> {
    rows.iter()
        .map(|row| {
            serenity::CreateActionRow::Buttons(
                row.iter()
                    .map(|b| {
                        serenity::CreateButton::new(b.action.custom_id())
                            .label(b.label.as_str())
                            .style(serenity::ButtonStyle::Secondary)
                    })
                    .collect(),
            )
        })
        .collect()
}

/// Map a Discord user and channel onto the quiz's notion of user and chat.
/// Server channels are groups; direct messages are private chats.
pub(crate) fn actor_for(
    user: &serenity::User,
    channel_id: serenity::ChannelId,
    guild_id: Option<serenity::GuildId>,
    cache: &Arc<serenity::Cache>,
) -> Actor {
    let title = guild_id.and_then(|g| g.name(cache));
    Actor {
        profile: Profile {
            id: user.id.get(),
            first_name: user.global_name.clone().unwrap_or_else(|| user.name.clone()),
            last_name: String::new(),
            username: user.name.clone(),
        },
        chat: ChatRef {
            id: channel_id.get(),
            is_group: guild_id.is_some(),
            title,
        },
    }
}
