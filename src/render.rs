//! Turning dispatcher responses into Discord messages

use crate::{
    action::Action,
    context::Context,
    dispatch::{ExtractedAudio, Response},
    helper::truncate,
    log_error, log_internal,
};
use anyhow::Result;
use std::future::Future;
use serenity::all::{
    ButtonStyle, Colour, ComponentInteraction, CreateActionRow, CreateAttachment, CreateButton,
    CreateEmbed, CreateEmbedFooter, CreateMessage, EditInteractionResponse, Message,
};

/// Discord limit on an embed field value.
pub const FIELD_VALUE_LIMIT: usize = 1024;
/// Discord limit on an embed title.
const TITLE_LIMIT: usize = 256;
/// Discord limit on buttons in a single action row.
const BUTTONS_PER_ROW: usize = 5;

pub const YOUTUBE_RED: u32 = 0xFF0000;
pub const SPOTIFY_GREEN: u32 = 0x1DB954;
pub const NEUTRAL_GREY: u32 = 0x5865F2;

/// Platform-neutral description of a rich message.  Fields are rendered in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub colour: u32,
    pub fields: Vec<Field>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub footer: Option<String>,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Button {
    /// Opens a URL in the browser
    Link { label: String, url: String },
    /// Comes back to us as an interaction
    Action { label: String, action: Action },
}

impl Payload {
    pub fn new(title: impl Into<String>, colour: u32) -> Self {
        let title: String = title.into();
        Self {
            title: truncate(&title, TITLE_LIMIT).into_owned(),
            colour,
            ..Default::default()
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Free text, cut to `budget` characters.
    pub fn description(mut self, text: &str, budget: usize) -> Self {
        self.description = Some(truncate(text, budget).into_owned());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl AsRef<str>, inline: bool) -> Self {
        let value = value.as_ref();
        // Discord rejects empty field values outright.
        let value = if value.trim().is_empty() { "-" } else { value };
        self.fields.push(Field {
            name: name.into(),
            value: truncate(value, FIELD_VALUE_LIMIT).into_owned(),
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url;
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn link_button(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.buttons.push(Button::Link {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    pub fn action_button(mut self, label: impl Into<String>, action: Action) -> Self {
        self.buttons.push(Button::Action {
            label: label.into(),
            action,
        });
        self
    }

    fn embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(&self.title)
            .colour(Colour::new(self.colour));

        if let Some(url) = &self.url {
            embed = embed.url(url);
        }
        if let Some(description) = &self.description {
            embed = embed.description(description);
        }
        for field in &self.fields {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(image) = &self.image {
            embed = embed.image(image);
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        embed
    }

    fn components(&self) -> Vec<CreateActionRow> {
        self.buttons
            .chunks(BUTTONS_PER_ROW)
            .map(|row| CreateActionRow::Buttons(row.iter().map(Button::create).collect()))
            .collect()
    }
}

impl Button {
    fn create(&self) -> CreateButton {
        match self {
            Button::Link { label, url } => CreateButton::new_link(url).label(label),
            Button::Action { label, action } => CreateButton::new(action.custom_id())
                .label(label)
                .style(ButtonStyle::Secondary),
        }
    }
}

/// A response converted to Discord builders, ready to be sent either as a new message or as an
/// interaction reply.
#[derive(Default)]
struct Rendered {
    content: Option<String>,
    embed: Option<CreateEmbed>,
    components: Vec<CreateActionRow>,
    attachment: Option<CreateAttachment>,
}

impl Rendered {
    async fn from_response(response: &Response) -> Result<Self> {
        Ok(match response {
            Response::Text(text) => Rendered {
                content: Some(text.clone()),
                ..Default::default()
            },
            Response::Embed(payload) => Rendered {
                embed: Some(payload.embed()),
                components: payload.components(),
                ..Default::default()
            },
            Response::Audio(audio) => Rendered {
                content: Some(format!("\u{1F3B5} Audio from <{}>", audio.source_url)),
                attachment: Some(attachment(audio).await?),
                ..Default::default()
            },
        })
    }

    fn into_message(self) -> CreateMessage {
        let mut builder = CreateMessage::new();
        if let Some(content) = self.content {
            builder = builder.content(content);
        }
        if let Some(embed) = self.embed {
            builder = builder.embed(embed);
        }
        if !self.components.is_empty() {
            builder = builder.components(self.components);
        }
        if let Some(attachment) = self.attachment {
            builder = builder.add_file(attachment);
        }
        builder
    }

    fn into_edit(self) -> EditInteractionResponse {
        let mut builder = EditInteractionResponse::new();
        if let Some(content) = self.content {
            builder = builder.content(content);
        }
        if let Some(embed) = self.embed {
            builder = builder.embed(embed);
        }
        if !self.components.is_empty() {
            builder = builder.components(self.components);
        }
        if let Some(attachment) = self.attachment {
            builder = builder.new_attachment(attachment);
        }
        builder
    }
}

async fn attachment(audio: &ExtractedAudio) -> Result<CreateAttachment> {
    Ok(CreateAttachment::path(audio.path()).await?)
}

/// What the user sees when Discord refuses the real response.
fn undeliverable_notice(response: &Response) -> String {
    match response {
        Response::Audio(_) => "\u{274C} The audio file could not be delivered. It is probably over \
                               this server's upload limit."
            .to_owned(),
        _ => "\u{274C} The result could not be delivered here. Please try again later.".to_owned(),
    }
}

/// Run `send`.  If it fails, log why and hand `notice` to `fallback` so the user isn't left
/// without an answer.  Only a failing fallback is reported as an error.
async fn deliver<S, F, Fut>(send: S, notice: String, fallback: F) -> Result<()>
where
    S: Future<Output = Result<()>>,
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    match send.await {
        Ok(()) => Ok(()),
        Err(e) => {
            log_error!("Could not deliver response: {:#}", e);
            fallback(notice).await
        }
    }
}

/// Send `response` as a reply to `msg`.  The response, and with it any temporary file, is
/// dropped once this returns, whether sending worked or not.
pub async fn reply(ctx: &Context<'_>, msg: &Message, response: Response) -> Result<()> {
    let notice = undeliverable_notice(&response);
    let send = async {
        let rendered = Rendered::from_response(&response).await?;
        msg.channel_id
            .send_message(ctx.cache_http, rendered.into_message().reference_message(msg))
            .await?;
        Ok::<(), anyhow::Error>(())
    };

    deliver(send, notice, |notice| async move {
        msg.reply(ctx.cache_http, notice).await?;
        Ok::<(), anyhow::Error>(())
    })
    .await?;

    log_internal!("Replied to command in {}", msg.channel_id);
    Ok(())
}

/// Answer a previously deferred button interaction.
pub async fn edit_interaction(
    ctx: &Context<'_>,
    interaction: &ComponentInteraction,
    response: Response,
) -> Result<()> {
    let notice = undeliverable_notice(&response);
    let send = async {
        let rendered = Rendered::from_response(&response).await?;
        interaction
            .edit_response(ctx.cache_http, rendered.into_edit())
            .await?;
        Ok::<(), anyhow::Error>(())
    };

    // Without this the deferred "thinking..." state lingers until Discord gives up on it.
    deliver(send, notice, |notice| async move {
        interaction
            .edit_response(ctx.cache_http, EditInteractionResponse::new().content(notice))
            .await?;
        Ok::<(), anyhow::Error>(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video_url::VideoId;
    use anyhow::anyhow;

    #[test]
    fn fields_keep_insertion_order() {
        let payload = Payload::new("t", NEUTRAL_GREY)
            .field("Views", "1", true)
            .field("Likes", "2", true)
            .field("Comments", "3", true);
        let names: Vec<_> = payload.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Views", "Likes", "Comments"]);
    }

    #[test]
    fn long_text_is_cut() {
        let long = "x".repeat(5000);
        let payload = Payload::new(long.clone(), NEUTRAL_GREY)
            .description(&long, 300)
            .field("Huge", &long, false);

        assert_eq!(payload.title.chars().count(), TITLE_LIMIT);
        let description = payload.description.unwrap();
        assert_eq!(description.chars().count(), 300);
        assert!(description.ends_with("..."));
        assert_eq!(payload.fields[0].value.chars().count(), FIELD_VALUE_LIMIT);
    }

    #[test]
    fn empty_field_values_are_replaced() {
        let payload = Payload::new("t", NEUTRAL_GREY).field("Blank", "  ", true);
        assert_eq!(payload.fields[0].value, "-");
    }

    #[tokio::test]
    async fn refused_response_falls_back_to_notice() {
        let mut sent = None;
        let result = deliver(
            async { Err::<(), _>(anyhow!("413 Request entity too large")) },
            undeliverable_notice(&Response::Text("hi".to_owned())),
            |notice| {
                sent = Some(notice);
                async { Ok::<(), anyhow::Error>(()) }
            },
        )
        .await;

        assert!(result.is_ok());
        assert!(sent.unwrap().contains("could not be delivered"));
    }

    #[tokio::test]
    async fn delivered_response_needs_no_notice() {
        let mut fell_back = false;
        deliver(
            async { Ok::<(), anyhow::Error>(()) },
            "unused".to_owned(),
            |_| {
                fell_back = true;
                async { Ok::<(), anyhow::Error>(()) }
            },
        )
        .await
        .unwrap();
        assert!(!fell_back);
    }

    #[tokio::test]
    async fn failing_notice_is_reported() {
        let result = deliver(
            async { Err::<(), _>(anyhow!("embed rejected")) },
            "notice".to_owned(),
            |_| async { Err::<(), _>(anyhow!("channel gone")) },
        )
        .await;
        assert_eq!(result.unwrap_err().to_string(), "channel gone");
    }

    #[test]
    fn buttons_wrap_into_rows() {
        let id = VideoId::from_raw("dQw4w9WgXcQ").unwrap();
        let mut payload = Payload::new("t", NEUTRAL_GREY);
        for i in 0..7 {
            payload = payload.action_button(format!("b{}", i), Action::ShowVideo(id.clone()));
        }
        assert_eq!(payload.components().len(), 2);
    }
}
