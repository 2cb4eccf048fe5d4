use crate::{action::Action, event::*, log_event, logging::*, plugin::*, render};
use anyhow::Result;
use serenity::all::{CreateInteractionResponse, Interaction};

/// Answers clicks on the buttons attached to lookup results
pub struct Buttons;

#[serenity::async_trait]
impl Plugin for Buttons {
    fn name(&self) -> &'static str {
        "buttons"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Interaction(Interaction::Component(interaction)) = event else {
            return Ok(EventHandled::No);
        };

        // Buttons from other bots or older builds; leave them for Discord to time out.
        let Some(action) = Action::parse(&interaction.data.custom_id) else {
            return Ok(EventHandled::No);
        };

        log_event!(
            "{} pressed `{}`",
            interaction.user.color(),
            interaction.data.custom_id
        );

        // Lookups can outlast Discord's three second window for a first answer.
        interaction
            .create_response(ctx.cache_http, CreateInteractionResponse::Defer(Default::default()))
            .await?;

        let response = ctx.dispatcher.run(action.command()).await;
        render::edit_interaction(ctx, interaction, response).await?;
        Ok(EventHandled::Yes)
    }
}
