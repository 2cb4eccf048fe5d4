mod action;
mod adapter;
mod cache;
mod classifier;
mod config;
mod context;
mod dispatch;
mod error;
mod event;
mod handler;
mod helper;
mod logging;
mod model;
mod plugin;
mod render;
mod video_url;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let dispatcher = crate::dispatch::Dispatcher::from_config(&cfg).await?;
    let handler = handler::Handler::new(cfg, dispatcher);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
