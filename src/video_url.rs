//! Recognizing YouTube video links

use regex::Regex;
use std::sync::LazyLock;

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:https?://)?
        (?:www\.)?
        (?:youtube\.com/(?:watch\?v=|shorts/)|youtu\.be/)
        ([A-Za-z0-9_-]{11})
        (?:[?&\#/].*)?$
        ",
    )
    .expect("video URL pattern is valid")
});

/// An 11 character YouTube video ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video ID from a link.  Returns `None` for anything that isn't a recognized
    /// video link; no network access is involved.
    pub fn from_url(input: &str) -> Option<Self> {
        VIDEO_URL
            .captures(input.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_owned()))
    }

    /// Accept an ID that was previously produced by this type, e.g. from a button payload.
    pub fn from_raw(id: &str) -> Option<Self> {
        let valid = id.len() == 11
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(id.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized link used as the cache key.
    pub fn canonical_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", self.0)
    }

    /// Lower resolution fallback; always exists even when `maxresdefault` does not.
    pub fn fallback_thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/hqdefault.jpg", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loose check used to decide whether a `check` query should go to the video source or the
/// music catalog.
pub fn looks_like_youtube(input: &str) -> bool {
    input.contains("youtube.com") || input.contains("youtu.be")
}
