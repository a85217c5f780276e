use std::sync::Arc;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tracing::{error, info};

use quiz_bot::bot::Bot;
use quiz_bot::config::{self, Settings};
use quiz_bot::dataset::Dataset;
use quiz_bot::quiz::QuizEngine;
use quiz_bot::session::Sessions;
use quiz_bot::state::AppState;
use quiz_bot::store::QuizStore;
use quiz_bot::{commands, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(config::log_level_from_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            error!("Startup aborted: {:#}", e);
            return Err(e);
        }
    };

    // Init data
    let dataset = Arc::new(Dataset::load(&settings.dataset_dir));
    info!(
        questions = dataset.len(),
        "Dataset loaded from {:?}", settings.dataset_dir
    );
    let store = QuizStore::open(&settings.data_dir)?;
    let quiz = Arc::new(QuizEngine::new(dataset, store, settings.daily_limit));

    let (sessions, timer_events) = Sessions::new(settings.timing);
    let bot = Arc::new(Bot::new(quiz.clone(), sessions));

    let app_state = AppState {
        bot: bot.clone(),
        settings: settings.clone(),
    };

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let guild_id = settings.guild_id.map(serenity::GuildId::new);
    let autosave_every = settings.autosave_every;
    let background_quiz = quiz.clone();

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} command(s):", commands.len());
                for cmd in commands {
                    info!("  /{}", cmd.name);
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, commands, gid).await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, commands).await?;
                }

                tokio::spawn(handlers::dispatch_timers(
                    ctx.http.clone(),
                    bot,
                    timer_events,
                ));
                tokio::spawn(background_quiz.autosave(autosave_every));

                Ok(app_state)
            })
        })
        .build();

    info!("Starting quiz bot...");

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                error!("Client error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    quiz.save_all().await;
    info!("Quiz data saved, exiting");
    Ok(())
}
