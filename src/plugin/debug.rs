use crate::{event::*, log_event, logging::*, plugin::*};
use anyhow::Result;
use serenity::all::Interaction;

/// Prints debug information about event to stdout
pub struct Debug;

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready(ready) => {
                log_event!(
                    "Connected to {} server(s) as {}",
                    ready.guilds.len(),
                    ctx.cache.current_user().color(),
                );
            }
            // Only commands are interesting; ordinary chat isn't ours to log.
            Event::Message(msg) if msg.content.starts_with(&ctx.cfg.general.command_prefix) => {
                log_event!(
                    "{}{}{}{}{}{} {}",
                    msg.guild_id.color(ctx.http).await,
                    Glue {}.color(),
                    msg.channel_id.color(ctx.http).await,
                    Glue {}.color(),
                    msg.author.color(),
                    Glue {}.color(),
                    msg.content,
                );
            }
            Event::Message(_) => {}
            Event::Interaction(Interaction::Component(_)) => {
                // Logged by the buttons plugin once it knows the button is ours
            }
            Event::Interaction(_) => log_event!("Ignoring unsupported interaction"),
        }

        Ok(EventHandled::No)
    }
}
