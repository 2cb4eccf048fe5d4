use crate::{classifier::DISCLAIMER, config::MetadataBackend, event::*, plugin::*};
use anyhow::Result;

pub struct Info;

#[serenity::async_trait]
impl Plugin for Info {
    fn name(&self) -> &'static str {
        "info"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!("{}{} - about this bot", prefix, self.name()))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        let video_source = match ctx.cfg.youtube.metadata_backend {
            MetadataBackend::Api => "YouTube Data API",
            MetadataBackend::YtDlp => "yt-dlp",
        };

        let reply = format!(
            "**{} {}**\n\
             Looks up YouTube videos and channels and Spotify tracks, and guesses whether they \
             are free to reuse.\n\
             Video details: {}\n\
             Channels: YouTube Data API\n\
             Tracks: Spotify Web API\n\
             Audio: yt-dlp\n\
             Type `{}help` for commands.\n\n\
             _{}_",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            video_source,
            ctx.cfg.general.command_prefix,
            DISCLAIMER,
        );

        msg.reply(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
