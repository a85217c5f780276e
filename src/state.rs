use std::sync::Arc;

use crate::bot::Bot;
use crate::config::Settings;

pub struct AppState {
    pub bot: Arc<Bot>,
    pub settings: Arc<Settings>,
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
