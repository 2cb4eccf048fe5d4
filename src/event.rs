//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! the handler translates the callbacks into a distinct Event enum.

use crate::{context::Context, log_error};
use serenity::all::{Interaction, Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
    Interaction(Interaction),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => log_error!("Error in plugin {}: {:#}", plugin.name(), err),
            }
        }
    }

    // Check if a message should be interpreted as a bot command.
    //
    // These are prefixed with the configured prefix, e. g. `!cmd foo bar baz`.  On a match,
    // returns the message and the argument text after the command name.
    pub fn is_bot_cmd<'a>(&'a self, ctx: &Context<'_>, cmd: &str) -> Option<(&'a Message, &'a str)> {
        let Event::Message(msg) = self else {
            return None;
        };

        match parse_command(&ctx.cfg.general.command_prefix, &msg.content) {
            Some((name, args)) if name == cmd => Some((msg, args)),
            _ => None,
        }
    }
}

/// Split `!name rest of line` into `("name", "rest of line")`.  Text without the prefix, or a
/// bare prefix, is not a command.
pub fn parse_command<'a>(prefix: &str, content: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest.trim_end(), ""),
    };

    if name.is_empty() {
        None
    } else {
        Some((name, args))
    }
}

pub enum EventHandled {
    Yes,
    No,
}
