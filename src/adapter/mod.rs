//! Seams between the bot and the outside world.  Each trait is implemented once against a real
//! service and once by fakes in tests.

use crate::{
    error::AdapterResult,
    model::{ChannelRecord, ChannelRef, TrackRecord, VideoRank, VideoRecord, VideoRef},
    video_url::VideoId,
};
use std::path::{Path, PathBuf};

pub mod spotify;
pub mod youtube;
pub mod ytdlp;

#[serenity::async_trait]
pub trait VideoSource: Send + Sync {
    /// Look up exactly one video.  Zero matches is `NotFound`.
    async fn video(&self, id: &VideoId) -> AdapterResult<VideoRecord>;
}

#[serenity::async_trait]
pub trait ChannelSource: Send + Sync {
    async fn channel(&self, channel_id: &str) -> AdapterResult<ChannelRecord>;
    /// The single top upload of a channel for the given ranking.
    async fn ranked_video(&self, channel_id: &str, rank: VideoRank) -> AdapterResult<VideoRef>;
    /// Legacy username lookup.  `NotFound` when no channel carries that username.
    async fn channel_by_username(&self, username: &str) -> AdapterResult<ChannelRef>;
    /// Free-text channel search, best match only.
    async fn search_channel(&self, query: &str) -> AdapterResult<ChannelRef>;
}

#[serenity::async_trait]
pub trait TrackSource: Send + Sync {
    /// Best catalog match for a free-text query.
    async fn search_track(&self, query: &str) -> AdapterResult<TrackRecord>;
}

#[serenity::async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Download the audio of `url` into `dest_dir` and return the path of the produced file.
    /// The caller owns `dest_dir` and is responsible for removing it.
    async fn extract_audio(&self, url: &str, dest_dir: &Path) -> AdapterResult<PathBuf>;
}
