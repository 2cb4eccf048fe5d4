pub use crate::context::Context;
use crate::event::{Event, EventHandled};
use anyhow::Result;

mod buttons;
mod debug;
mod help;
mod ignore_bots;
mod info;
mod lookup;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  For commands this is also the word typed after the prefix
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    let mut plugins: Vec<Box<dyn Plugin>> = vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(buttons::Buttons),
        Box::new(help::Help),
        Box::new(info::Info),
    ];

    // Media lookups, in the order they are listed by help
    plugins.extend(
        lookup::LOOKUPS
            .iter()
            .map(|lookup| Box::new(*lookup) as Box<dyn Plugin>),
    );

    plugins
}
