//! YouTube Data API v3 adapter

use crate::{
    adapter::{ChannelSource, VideoSource},
    error::{AdapterError, AdapterResult},
    helper::parse_iso8601_duration,
    log_internal,
    model::{ChannelRecord, ChannelRef, VideoRank, VideoRecord, VideoRef},
    video_url::VideoId,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashMap;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Client for the handful of Data API endpoints the bot uses.  Cheap to share; `reqwest::Client`
/// pools connections internally.
pub struct YouTubeApi {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeApi {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> AdapterResult<T> {
        let url = format!("{}/{}", API_BASE, endpoint);

        log_internal!("YouTube API {} {:?}... ", endpoint, query);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = google_error_reason(&body);
            return Err(AdapterError::from_status(status, reason.as_deref(), &body));
        }

        let parsed = response.json::<T>().await?;
        log_internal!("YouTube API {} {:?}... done", endpoint, query);
        Ok(parsed)
    }

    async fn channel_statistics(&self, channel_id: &str) -> AdapterResult<Option<Statistics>> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "statistics"), ("id", channel_id)])
            .await?;
        Ok(response.items.into_iter().next().map(|c| c.statistics))
    }

    async fn search_one(&self, query: &[(&str, &str)]) -> AdapterResult<SearchItem> {
        let response: ListResponse<SearchItem> = self.get("search", query).await?;
        response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("search {:?} returned nothing", query)))
    }
}

#[serenity::async_trait]
impl VideoSource for YouTubeApi {
    async fn video(&self, id: &VideoId) -> AdapterResult<VideoRecord> {
        let response: ListResponse<VideoItem> = self
            .get(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics,status"),
                    ("id", id.as_str()),
                ],
            )
            .await?;

        let item = exactly_one(response.items, id)?;

        // Second round trip: the video response only names its channel.
        let channel_stats = match self.channel_statistics(&item.snippet.channel_id).await {
            Ok(stats) => stats,
            Err(AdapterError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(video_record(item, channel_stats.as_ref()))
    }
}

#[serenity::async_trait]
impl ChannelSource for YouTubeApi {
    async fn channel(&self, channel_id: &str) -> AdapterResult<ChannelRecord> {
        let response: ListResponse<ChannelItem> = self
            .get(
                "channels",
                &[
                    ("part", "snippet,statistics,brandingSettings"),
                    ("id", channel_id),
                ],
            )
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(channel_record)
            .ok_or_else(|| AdapterError::NotFound(format!("channel {}", channel_id)))
    }

    async fn ranked_video(&self, channel_id: &str, rank: VideoRank) -> AdapterResult<VideoRef> {
        let order = match rank {
            VideoRank::MostRecent => "date",
            VideoRank::MostViewed => "viewCount",
        };

        let item = self
            .search_one(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("order", order),
                ("type", "video"),
                ("maxResults", "1"),
            ])
            .await?;

        let id = item
            .id
            .video_id
            .ok_or_else(|| AdapterError::NotFound(format!("no {} video", order)))?;
        Ok(VideoRef {
            id,
            title: unescape_html(&item.snippet.title),
        })
    }

    async fn channel_by_username(&self, username: &str) -> AdapterResult<ChannelRef> {
        let response: ListResponse<ChannelItem> = self
            .get("channels", &[("part", "snippet"), ("forUsername", username)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|c| ChannelRef {
                id: c.id,
                title: c.snippet.title,
            })
            .ok_or_else(|| AdapterError::NotFound(format!("username {}", username)))
    }

    async fn search_channel(&self, query: &str) -> AdapterResult<ChannelRef> {
        let item = self
            .search_one(&[
                ("part", "snippet"),
                ("type", "channel"),
                ("q", query),
                ("maxResults", "1"),
            ])
            .await?;

        let id = item
            .id
            .channel_id
            .or(item.snippet.channel_id)
            .ok_or_else(|| AdapterError::NotFound(format!("channel search {}", query)))?;
        let title = item.snippet.channel_title.unwrap_or(item.snippet.title);
        Ok(ChannelRef {
            id,
            title: unescape_html(&title),
        })
    }
}

/// Only cache-worthy if the API matched exactly the video we asked for.
fn exactly_one(items: Vec<VideoItem>, id: &VideoId) -> AdapterResult<VideoItem> {
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (None, _) => Err(AdapterError::NotFound(format!("video {}", id))),
        (Some(item), None) if item.id == id.as_str() => Ok(item),
        (Some(item), None) => Err(AdapterError::UpstreamUnavailable(format!(
            "asked for video {} but got {}",
            id, item.id
        ))),
        (Some(_), Some(_)) => Err(AdapterError::UpstreamUnavailable(format!(
            "ambiguous result for video {}",
            id
        ))),
    }
}

fn video_record(item: VideoItem, channel: Option<&Statistics>) -> VideoRecord {
    let id = VideoId::from_raw(&item.id);
    let source_url = id
        .as_ref()
        .map(VideoId::canonical_url)
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", item.id));

    VideoRecord {
        title: item.snippet.title,
        description: item.snippet.description,
        channel_name: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        view_count: parse_count(&item.statistics.view_count),
        like_count: parse_count(&item.statistics.like_count),
        comment_count: parse_count(&item.statistics.comment_count),
        // Live streams report `P0D`; anything unparseable is treated the same way.
        duration_seconds: parse_iso8601_duration(&item.content_details.duration).unwrap_or(0),
        channel_subscriber_count: channel.and_then(|s| parse_count(&s.subscriber_count)),
        channel_video_count: channel.and_then(|s| parse_count(&s.video_count)),
        thumbnail_url: best_thumbnail(&item.snippet.thumbnails),
        license_label: license_label(item.status.license.as_deref()),
        source_url,
        id: item.id,
    }
}

fn channel_record(item: ChannelItem) -> ChannelRecord {
    ChannelRecord {
        subscriber_count: parse_count(&item.statistics.subscriber_count),
        view_count: parse_count(&item.statistics.view_count),
        video_count: parse_count(&item.statistics.video_count),
        created_at: item.snippet.published_at,
        profile_image_url: best_thumbnail(&item.snippet.thumbnails),
        banner_image_url: item
            .branding_settings
            .image
            .and_then(|image| image.banner_external_url),
        title: item.snippet.title,
        description: item.snippet.description,
        id: item.id,
    }
}

/// Human readable form of the API's `status.license` value.
pub fn license_label(raw: Option<&str>) -> String {
    match raw {
        Some("creativeCommon") => "Creative Commons".to_owned(),
        Some("youtube") | None => "Standard YouTube License".to_owned(),
        Some(other) => other.to_owned(),
    }
}

fn best_thumbnail(thumbnails: &HashMap<String, Thumbnail>) -> Option<String> {
    ["maxres", "standard", "high", "medium", "default"]
        .iter()
        .find_map(|size| thumbnails.get(*size))
        .map(|t| t.url.clone())
}

/// The API serializes counts as decimal strings.
fn parse_count(raw: &Option<String>) -> Option<u64> {
    raw.as_deref().and_then(|s| s.parse().ok())
}

/// Search results come back HTML-escaped.
fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn google_error_reason(body: &str) -> Option<String> {
    let parsed: GoogleErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .errors
        .into_iter()
        .next()
        .map(|e| e.reason)
        .or(parsed.error.status)
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    errors: Vec<GoogleErrorItem>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorItem {
    reason: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    status: VideoStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    channel_id: String,
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
    subscriber_count: Option<String>,
    video_count: Option<String>,
}

#[derive(Deserialize, Default)]
struct VideoStatus {
    license: Option<String>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: String,
    #[serde(default)]
    snippet: ChannelSnippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    branding_settings: BrandingSettings,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Deserialize, Default)]
struct BrandingSettings {
    image: Option<BrandingImage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrandingImage {
    banner_external_url: Option<String>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchId,
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
    channel_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    channel_id: Option<String>,
    channel_title: Option<String>,
}
