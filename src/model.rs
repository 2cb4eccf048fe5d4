//! Normalized records produced by the adapters.  Every upstream response is mapped into one of
//! these before anything else in the bot looks at it.

use chrono::{DateTime, Utc};

/// A single video as reported by the video metadata source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Counts are optional because uploaders can hide them.
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub duration_seconds: u64,
    pub channel_subscriber_count: Option<u64>,
    pub channel_video_count: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub license_label: String,
    /// Canonical watch URL.  Doubles as the cache key.
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subscriber_count: Option<u64>,
    pub view_count: Option<u64>,
    pub video_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub profile_image_url: Option<String>,
    pub banner_image_url: Option<String>,
}

impl ChannelRecord {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/channel/{}", self.id)
    }
}

/// Lightweight pointer to a video, e.g. a channel's most viewed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRef {
    pub id: String,
    pub title: String,
}

impl VideoRef {
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Result of resolving a handle to a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRef {
    pub id: String,
    pub title: String,
}

/// A track from the music catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub id: String,
    pub title: String,
    /// In the order the catalog lists them
    pub artist_names: Vec<String>,
    pub album_name: String,
    pub release_date: String,
    pub catalog_url: String,
    pub thumbnail_url: Option<String>,
    pub copyright_text: String,
}

/// Which way a channel's uploads are ranked when picking a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRank {
    MostRecent,
    MostViewed,
}

/// Best-effort guess at whether content is free to reuse.  Never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseVerdict {
    pub is_likely_restricted: bool,
    pub basis: VerdictBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictBasis {
    LicenseField,
    TextHeuristic,
    CatalogPresence,
}

impl VerdictBasis {
    pub fn describe(&self) -> &'static str {
        match self {
            VerdictBasis::LicenseField => "license field",
            VerdictBasis::TextHeuristic => "title/description keywords",
            VerdictBasis::CatalogPresence => "listed in music catalog",
        }
    }
}
