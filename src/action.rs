//! Button actions.
//!
//! Buttons carry a stable identifier in their `custom_id` (`<action>:<video-id>`) instead of a
//! registered callback.  When Discord hands a click back to us, this table maps the identifier to
//! the command that answers it, so buttons keep working across restarts.

use crate::{dispatch::Command, video_url::VideoId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowVideo(VideoId),
    CheckVideo(VideoId),
    ShowThumbnail(VideoId),
}

type Constructor = fn(VideoId) -> Action;

const TABLE: &[(&str, Constructor)] = &[
    ("fetch", Action::ShowVideo),
    ("check", Action::CheckVideo),
    ("thumb", Action::ShowThumbnail),
];

impl Action {
    fn key(&self) -> &'static str {
        match self {
            Action::ShowVideo(_) => "fetch",
            Action::CheckVideo(_) => "check",
            Action::ShowThumbnail(_) => "thumb",
        }
    }

    fn video_id(&self) -> &VideoId {
        match self {
            Action::ShowVideo(id) | Action::CheckVideo(id) | Action::ShowThumbnail(id) => id,
        }
    }

    /// Value to put in the button's `custom_id`.  Discord caps these at 100 characters.
    pub fn custom_id(&self) -> String {
        format!("{}:{}", self.key(), self.video_id())
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let (key, id) = custom_id.split_once(':')?;
        let id = VideoId::from_raw(id)?;
        TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, constructor)| constructor(id))
    }

    /// The command whose response answers a click on this button.
    pub fn command(&self) -> Command {
        let url = self.video_id().canonical_url();
        match self {
            Action::ShowVideo(_) => Command::Fetch { url },
            Action::CheckVideo(_) => Command::Check { query: url },
            Action::ShowThumbnail(_) => Command::Thumb { url },
        }
    }
}
