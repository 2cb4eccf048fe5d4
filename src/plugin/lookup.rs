//! The media lookup commands.  They all share one shape: take the text after the command name,
//! hand it to the dispatcher while showing a typing indicator, reply with whatever comes back.

use crate::{dispatch::Command, event::*, plugin::*, render};
use anyhow::Result;

#[derive(Clone, Copy)]
pub struct Lookup {
    name: &'static str,
    args: &'static str,
    about: &'static str,
    build: fn(String) -> Command,
}

pub const LOOKUPS: &[Lookup] = &[
    Lookup {
        name: "fetch",
        args: "<youtube-url>",
        about: "show details about a video",
        build: |url| Command::Fetch { url },
    },
    Lookup {
        name: "check",
        args: "<youtube-url | song title>",
        about: "estimate whether a video or song is likely copyrighted",
        build: |query| Command::Check { query },
    },
    Lookup {
        name: "youtube",
        args: "<channel-id>",
        about: "show statistics for a channel",
        build: |channel_id| Command::ChannelStats { channel_id },
    },
    Lookup {
        name: "getid",
        args: "<@handle>",
        about: "find the ID of a channel",
        build: |handle| Command::GetId { handle },
    },
    Lookup {
        name: "thumb",
        args: "<youtube-url>",
        about: "show the thumbnail of a video",
        build: |url| Command::Thumb { url },
    },
    Lookup {
        name: "extract",
        args: "<youtube-url>",
        about: "download the audio of a video as a file",
        build: |url| Command::Extract { url },
    },
];

#[serenity::async_trait]
impl Plugin for Lookup {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!(
            "{}{} {} - {}",
            prefix, self.name, self.args, self.about
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        if args.is_empty() {
            let usage = self.usage(ctx).await.unwrap_or_default();
            msg.reply(ctx.cache_http, format!("Usage: `{}`", usage))
                .await?;
            return Ok(EventHandled::Yes);
        }

        let typing = msg.channel_id.start_typing(ctx.http);
        let response = ctx.dispatcher.run((self.build)(args.to_owned())).await;
        typing.stop();

        render::reply(ctx, msg, response).await?;
        Ok(EventHandled::Yes)
    }
}
