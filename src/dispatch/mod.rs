//! Turns a parsed chat command into a response.
//!
//! Each invocation is independent: parse input, consult the cache or one adapter, classify where
//! applicable, build a payload.  Failures are converted to user-facing text here and nowhere
//! else.

use crate::{
    adapter::{
        spotify::SpotifyApi, youtube::YouTubeApi, ytdlp::YtDlp, AudioExtractor, ChannelSource,
        TrackSource, VideoSource,
    },
    cache::{JsonFileStore, MetadataStore},
    classifier::{classify_track, classify_video},
    config::{Config, MetadataBackend},
    error::{AdapterError, AdapterResult},
    log_error, log_internal,
    model::{VideoRank, VideoRecord, VideoRef},
    render::Payload,
    video_url::{looks_like_youtube, VideoId},
};
use anyhow::Result;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tempfile::TempDir;

pub mod payload;

/// A chat command with its argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch { url: String },
    Check { query: String },
    ChannelStats { channel_id: String },
    GetId { handle: String },
    Thumb { url: String },
    Extract { url: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Fetch { .. } => "fetch",
            Command::Check { .. } => "check",
            Command::ChannelStats { .. } => "youtube",
            Command::GetId { .. } => "getid",
            Command::Thumb { .. } => "thumb",
            Command::Extract { .. } => "extract",
        }
    }
}

pub enum Response {
    Text(String),
    Embed(Payload),
    Audio(ExtractedAudio),
}

/// Audio file living in its own scratch directory.  Dropping this removes the directory and the
/// file with it, so the file is gone whether or not it was ever sent.
pub struct ExtractedAudio {
    path: PathBuf,
    pub source_url: String,
    dir: TempDir,
}

impl ExtractedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ExtractedAudio {
    fn drop(&mut self) {
        log_internal!("Removing extracted audio `{}`", self.dir.path().to_string_lossy());
    }
}

/// The external collaborators, passed in so tests can substitute fakes.
pub struct Services {
    pub videos: Arc<dyn VideoSource>,
    pub channels: Arc<dyn ChannelSource>,
    pub tracks: Arc<dyn TrackSource>,
    pub extractor: Arc<dyn AudioExtractor>,
    pub cache: Arc<dyn MetadataStore>,
}

pub struct Limits {
    pub command_timeout: Duration,
    pub extract_timeout: Duration,
    pub description_budget: usize,
}

pub struct Dispatcher {
    services: Services,
    limits: Limits,
}

impl Dispatcher {
    pub fn new(services: Services, limits: Limits) -> Self {
        Self { services, limits }
    }

    /// Wire up the real adapters described by the configuration.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let limits = Limits {
            command_timeout: Duration::from_secs(cfg.limits.command_timeout_seconds),
            extract_timeout: Duration::from_secs(cfg.limits.extract_timeout_seconds),
            description_budget: cfg.limits.description_budget,
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("tubebot/", env!("CARGO_PKG_VERSION")))
            .timeout(limits.command_timeout)
            .build()?;

        let youtube = Arc::new(YouTubeApi::new(http.clone(), cfg.youtube.api_key.clone()));
        let ytdlp = Arc::new(YtDlp::new(
            cfg.extract.yt_dlp_path.clone(),
            cfg.extract.audio_format.clone(),
            cfg.extract.max_upload_bytes,
        ));
        let videos: Arc<dyn VideoSource> = match cfg.youtube.metadata_backend {
            MetadataBackend::Api => youtube.clone(),
            MetadataBackend::YtDlp => ytdlp.clone(),
        };

        let services = Services {
            videos,
            channels: youtube,
            tracks: Arc::new(SpotifyApi::new(
                http,
                cfg.spotify.client_id.clone(),
                cfg.spotify.client_secret.clone(),
            )),
            extractor: ytdlp,
            cache: Arc::new(JsonFileStore::load(cfg.cache_path()?).await?),
        };

        Ok(Self::new(services, limits))
    }

    /// Run one command to completion.  Never fails: errors and timeouts come back as a text
    /// response explaining what went wrong.
    pub async fn run(&self, command: Command) -> Response {
        let name = command.name();
        let timeout = match command {
            Command::Extract { .. } => self.limits.extract_timeout,
            _ => self.limits.command_timeout,
        };

        let result = match tokio::time::timeout(timeout, self.execute(command)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::UpstreamUnavailable(format!(
                "{} timed out after {}s",
                name,
                timeout.as_secs_f32()
            ))),
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                log_error!("Command {} failed: {}", name, e);
                Response::Text(user_message(&e))
            }
        }
    }

    async fn execute(&self, command: Command) -> AdapterResult<Response> {
        match command {
            Command::Fetch { url } => self.fetch(&url).await,
            Command::Check { query } => self.check(&query).await,
            Command::ChannelStats { channel_id } => self.channel_stats(&channel_id).await,
            Command::GetId { handle } => self.get_id(&handle).await,
            Command::Thumb { url } => self.thumb(&url),
            Command::Extract { url } => self.extract(&url).await,
        }
    }

    /// Cache first, then the video source.  Only a successful, validated lookup is stored.
    async fn video(&self, id: &VideoId) -> AdapterResult<VideoRecord> {
        let key = id.canonical_url();
        if let Some(record) = self.services.cache.get(&key).await {
            log_internal!("Cache hit for {}", key);
            return Ok(record);
        }

        log_internal!("Cache miss for {}", key);
        let record = self.services.videos.video(id).await?;
        if let Err(e) = self.services.cache.put(&key, &record).await {
            // Not fatal; the record is still good.
            log_error!("Could not cache {}: {}", key, e);
        }
        Ok(record)
    }

    async fn fetch(&self, url: &str) -> AdapterResult<Response> {
        let id = parse_video_url(url)?;
        let record = self.video(&id).await?;
        Ok(Response::Embed(payload::video(
            &record,
            self.limits.description_budget,
        )))
    }

    async fn check(&self, query: &str) -> AdapterResult<Response> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdapterError::MalformedInput(
                "give a YouTube link or a song title".to_owned(),
            ));
        }

        if looks_like_youtube(query) {
            let id = parse_video_url(query)?;
            let record = self.video(&id).await?;
            let verdict = classify_video(&record);
            Ok(Response::Embed(payload::video_check(&record, &verdict)))
        } else {
            let track = self.services.tracks.search_track(query).await?;
            let verdict = classify_track(&track);
            Ok(Response::Embed(payload::track_check(&track, &verdict)))
        }
    }

    async fn channel_stats(&self, channel_id: &str) -> AdapterResult<Response> {
        let channel_id = channel_id.trim();
        let valid = !channel_id.is_empty()
            && channel_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AdapterError::MalformedInput(
                "expected a channel ID like `UCuAXFkgsw1L7xaCfnd5JJOw` (use getid to find one)"
                    .to_owned(),
            ));
        }

        let channels = &self.services.channels;
        let (channel, latest, most_viewed) = tokio::join!(
            channels.channel(channel_id),
            channels.ranked_video(channel_id, VideoRank::MostRecent),
            channels.ranked_video(channel_id, VideoRank::MostViewed),
        );

        let channel = channel?;
        let latest = optional_video(latest)?;
        let most_viewed = optional_video(most_viewed)?;

        Ok(Response::Embed(payload::channel(
            &channel,
            latest.as_ref(),
            most_viewed.as_ref(),
            self.limits.description_budget,
        )))
    }

    async fn get_id(&self, handle: &str) -> AdapterResult<Response> {
        let handle = handle.trim().trim_start_matches('@');
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return Err(AdapterError::MalformedInput(
                "expected a single channel handle like `@RickAstleyYT`".to_owned(),
            ));
        }

        let channels = &self.services.channels;
        let channel = match channels.channel_by_username(handle).await {
            Err(AdapterError::NotFound(_)) => {
                log_internal!("No channel with username {}, searching instead", handle);
                channels.search_channel(handle).await?
            }
            other => other?,
        };

        Ok(Response::Text(format!(
            "The channel ID for `{}` is `{}` ({}).",
            handle, channel.id, channel.title
        )))
    }

    fn thumb(&self, url: &str) -> AdapterResult<Response> {
        let id = parse_video_url(url)?;
        Ok(Response::Embed(payload::thumbnail(&id)))
    }

    async fn extract(&self, url: &str) -> AdapterResult<Response> {
        let id = parse_video_url(url)?;
        let source_url = id.canonical_url();

        let dir = tempfile::Builder::new()
            .prefix("tubebot-")
            .tempdir()
            .map_err(|e| AdapterError::UpstreamUnavailable(format!("no scratch space: {}", e)))?;

        // On error `dir` is dropped on the way out, taking any partial output with it.
        let path = self
            .services
            .extractor
            .extract_audio(&source_url, dir.path())
            .await?;

        Ok(Response::Audio(ExtractedAudio {
            path,
            source_url,
            dir,
        }))
    }
}

fn parse_video_url(url: &str) -> AdapterResult<VideoId> {
    VideoId::from_url(url).ok_or_else(|| {
        AdapterError::MalformedInput(
            "that doesn't look like a YouTube video link (youtube.com/watch?v=..., \
             youtube.com/shorts/... or youtu.be/...)"
                .to_owned(),
        )
    })
}

/// A channel without uploads has no ranked video; that's not an error for the whole command.
fn optional_video(result: AdapterResult<VideoRef>) -> AdapterResult<Option<VideoRef>> {
    match result {
        Ok(video) => Ok(Some(video)),
        Err(AdapterError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The only place a failure is worded for users.
pub fn user_message(error: &AdapterError) -> String {
    match error {
        AdapterError::NotFound(_) => {
            "\u{274C} Nothing found. Double-check the link, ID or search terms.".to_owned()
        }
        AdapterError::QuotaExceeded(_) => {
            "\u{274C} Rate limit reached. Please try again later.".to_owned()
        }
        AdapterError::UpstreamUnavailable(detail) => format!(
            "\u{274C} That content is unavailable or private, or the service could not be reached \
             ({}). Please try again later.",
            detail
        ),
        AdapterError::MalformedInput(detail) => format!("\u{274C} Invalid input: {}.", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::tests::sample_record,
        model::{ChannelRecord, ChannelRef, TrackRecord},
    };
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::Mutex;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    #[derive(Default)]
    struct FakeVideos {
        calls: AtomicUsize,
        error: Option<AdapterError>,
    }

    #[serenity::async_trait]
    impl VideoSource for FakeVideos {
        async fn video(&self, id: &VideoId) -> AdapterResult<VideoRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(sample_record(id.as_str())),
            }
        }
    }

    #[derive(Default)]
    struct FakeChannels {
        known_username: Option<&'static str>,
        empty_channel: bool,
    }

    fn channel_ref(title: &str) -> ChannelRef {
        ChannelRef {
            id: "UCuAXFkgsw1L7xaCfnd5JJOw".to_owned(),
            title: title.to_owned(),
        }
    }

    #[serenity::async_trait]
    impl ChannelSource for FakeChannels {
        async fn channel(&self, channel_id: &str) -> AdapterResult<ChannelRecord> {
            Ok(ChannelRecord {
                id: channel_id.to_owned(),
                title: "Rick Astley".to_owned(),
                description: "Official channel".to_owned(),
                subscriber_count: Some(4_000_000),
                view_count: Some(2_000_000_000),
                video_count: Some(300),
                created_at: None,
                profile_image_url: None,
                banner_image_url: None,
            })
        }

        async fn ranked_video(&self, _: &str, rank: VideoRank) -> AdapterResult<VideoRef> {
            if self.empty_channel {
                return Err(AdapterError::NotFound("no uploads".to_owned()));
            }
            let id = match rank {
                VideoRank::MostRecent => "aaaaaaaaaaa",
                VideoRank::MostViewed => "dQw4w9WgXcQ",
            };
            Ok(VideoRef {
                id: id.to_owned(),
                title: format!("{:?}", rank),
            })
        }

        async fn channel_by_username(&self, username: &str) -> AdapterResult<ChannelRef> {
            match self.known_username {
                Some(known) if known == username => Ok(channel_ref("By username")),
                _ => Err(AdapterError::NotFound(username.to_owned())),
            }
        }

        async fn search_channel(&self, query: &str) -> AdapterResult<ChannelRef> {
            if query == "nobody" {
                Err(AdapterError::NotFound(query.to_owned()))
            } else {
                Ok(channel_ref("By search"))
            }
        }
    }

    struct FakeTracks;

    #[serenity::async_trait]
    impl TrackSource for FakeTracks {
        async fn search_track(&self, query: &str) -> AdapterResult<TrackRecord> {
            Ok(TrackRecord {
                id: "4uLU6hMCjMI75M1A2tKUQC".to_owned(),
                title: query.to_owned(),
                artist_names: vec!["Rick Astley".to_owned()],
                album_name: "Whenever You Need Somebody".to_owned(),
                release_date: "1987-11-12".to_owned(),
                catalog_url: "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC".to_owned(),
                thumbnail_url: None,
                copyright_text: "(P) 1987 Sony Music".to_owned(),
            })
        }
    }

    enum Extraction {
        Succeed,
        FailHalfway,
        Hang,
    }

    struct FakeExtractor(Extraction);

    #[serenity::async_trait]
    impl AudioExtractor for FakeExtractor {
        async fn extract_audio(&self, _: &str, dest_dir: &Path) -> AdapterResult<PathBuf> {
            let path = dest_dir.join("dQw4w9WgXcQ.mp3");
            match self.0 {
                Extraction::Succeed => {
                    std::fs::write(&path, b"ID3").unwrap();
                    Ok(path)
                }
                Extraction::FailHalfway => {
                    std::fs::write(dest_dir.join("dQw4w9WgXcQ.mp3.part"), b"ID").unwrap();
                    Err(AdapterError::UpstreamUnavailable("ffmpeg died".to_owned()))
                }
                Extraction::Hang => {
                    std::fs::write(dest_dir.join("dQw4w9WgXcQ.mp3.part"), b"ID").unwrap();
                    std::future::pending().await
                }
            }
        }
    }

    /// Records every directory handed to the extractor so tests can check it was cleaned up.
    struct Spy<E> {
        inner: E,
        dirs: std::sync::Mutex<Vec<PathBuf>>,
    }

    #[serenity::async_trait]
    impl<E: AudioExtractor> AudioExtractor for Spy<E> {
        async fn extract_audio(&self, url: &str, dest_dir: &Path) -> AdapterResult<PathBuf> {
            self.dirs.lock().unwrap().push(dest_dir.to_owned());
            self.inner.extract_audio(url, dest_dir).await
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, VideoRecord>>);

    #[serenity::async_trait]
    impl MetadataStore for MemoryStore {
        async fn get(&self, key: &str) -> Option<VideoRecord> {
            self.0.lock().await.get(key).cloned()
        }

        async fn put(&self, key: &str, record: &VideoRecord) -> Result<()> {
            self.0.lock().await.insert(key.to_owned(), record.clone());
            Ok(())
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        videos: Arc<FakeVideos>,
        store: Arc<MemoryStore>,
        extractor: Arc<Spy<FakeExtractor>>,
    }

    fn harness(videos: FakeVideos, channels: FakeChannels, extraction: Extraction) -> Harness {
        let videos = Arc::new(videos);
        let store = Arc::new(MemoryStore::default());
        let extractor = Arc::new(Spy {
            inner: FakeExtractor(extraction),
            dirs: Default::default(),
        });
        let services = Services {
            videos: videos.clone(),
            channels: Arc::new(channels),
            tracks: Arc::new(FakeTracks),
            extractor: extractor.clone(),
            cache: store.clone(),
        };
        let limits = Limits {
            command_timeout: Duration::from_millis(200),
            extract_timeout: Duration::from_millis(200),
            description_budget: 300,
        };
        Harness {
            dispatcher: Dispatcher::new(services, limits),
            videos,
            store,
            extractor,
        }
    }

    fn default_harness() -> Harness {
        harness(
            FakeVideos::default(),
            FakeChannels::default(),
            Extraction::Succeed,
        )
    }

    fn embed(response: Response) -> Payload {
        match response {
            Response::Embed(payload) => payload,
            Response::Text(text) => panic!("expected an embed, got text: {}", text),
            Response::Audio(_) => panic!("expected an embed, got audio"),
        }
    }

    fn text(response: Response) -> String {
        match response {
            Response::Text(text) => text,
            _ => panic!("expected text"),
        }
    }

    #[tokio::test]
    async fn thumb_needs_no_lookup() {
        let h = default_harness();
        let payload = embed(
            h.dispatcher
                .run(Command::Thumb {
                    url: "https://www.youtube.com/shorts/dQw4w9WgXcQ".to_owned(),
                })
                .await,
        );
        assert_eq!(
            payload.image.as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(h.videos.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_link_is_reported_without_calls() {
        let h = default_harness();
        let reply = text(
            h.dispatcher
                .run(Command::Fetch {
                    url: "https://vimeo.com/12345".to_owned(),
                })
                .await,
        );
        assert!(reply.starts_with("\u{274C} Invalid input"));
        assert_eq!(h.videos.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_check_is_served_from_cache() {
        let h = default_harness();
        let first = embed(
            h.dispatcher
                .run(Command::Check {
                    query: URL.to_owned(),
                })
                .await,
        );
        let second = embed(
            h.dispatcher
                .run(Command::Check {
                    query: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42".to_owned(),
                })
                .await,
        );

        assert_eq!(first, second);
        assert_eq!(h.videos.calls.load(Ordering::SeqCst), 1);
        assert!(h
            .store
            .get("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn failed_lookup_is_not_cached() {
        let h = harness(
            FakeVideos {
                error: Some(AdapterError::QuotaExceeded("quotaExceeded".to_owned())),
                ..Default::default()
            },
            FakeChannels::default(),
            Extraction::Succeed,
        );
        let reply = text(h.dispatcher.run(Command::Fetch { url: URL.to_owned() }).await);
        assert_eq!(reply, "\u{274C} Rate limit reached. Please try again later.");
        assert!(h.store.0.lock().await.is_empty());
    }

    #[tokio::test]
    async fn free_text_check_goes_to_catalog() {
        let h = default_harness();
        let payload = embed(
            h.dispatcher
                .run(Command::Check {
                    query: "never gonna give you up".to_owned(),
                })
                .await,
        );
        assert_eq!(payload.title, "Spotify Track Information");
        assert!(payload
            .fields
            .iter()
            .any(|f| f.name == "Status" && f.value.contains("copyrighted")));
        assert_eq!(h.videos.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn getid_falls_back_to_search() {
        let h = harness(
            FakeVideos::default(),
            FakeChannels {
                known_username: Some("RickAstleyVEVO"),
                ..Default::default()
            },
            Extraction::Succeed,
        );

        let direct = text(
            h.dispatcher
                .run(Command::GetId {
                    handle: "@RickAstleyVEVO".to_owned(),
                })
                .await,
        );
        assert!(direct.contains("By username"));
        assert!(direct.contains("UCuAXFkgsw1L7xaCfnd5JJOw"));

        let searched = text(
            h.dispatcher
                .run(Command::GetId {
                    handle: "RickAstleyYT".to_owned(),
                })
                .await,
        );
        assert!(searched.contains("By search"));

        let missing = text(
            h.dispatcher
                .run(Command::GetId {
                    handle: "nobody".to_owned(),
                })
                .await,
        );
        assert!(missing.starts_with("\u{274C} Nothing found"));
    }

    #[tokio::test]
    async fn channel_stats_tolerate_missing_uploads() {
        let h = harness(
            FakeVideos::default(),
            FakeChannels {
                empty_channel: true,
                ..Default::default()
            },
            Extraction::Succeed,
        );
        let payload = embed(
            h.dispatcher
                .run(Command::ChannelStats {
                    channel_id: "UCuAXFkgsw1L7xaCfnd5JJOw".to_owned(),
                })
                .await,
        );
        assert_eq!(payload.title, "Rick Astley");
        assert!(payload
            .fields
            .iter()
            .any(|f| f.name == "Latest upload" && f.value == "None"));

        let reply = text(
            h.dispatcher
                .run(Command::ChannelStats {
                    channel_id: "not a channel!".to_owned(),
                })
                .await,
        );
        assert!(reply.starts_with("\u{274C} Invalid input"));
    }

    #[tokio::test]
    async fn extracted_audio_is_removed_after_use() {
        let h = default_harness();
        let response = h
            .dispatcher
            .run(Command::Extract { url: URL.to_owned() })
            .await;
        let path = match &response {
            Response::Audio(audio) => {
                assert_eq!(audio.source_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
                audio.path().to_owned()
            }
            _ => panic!("expected audio"),
        };
        assert!(path.exists());
        drop(response);
        assert!(!path.exists());
        assert!(!h.extractor.dirs.lock().unwrap()[0].exists());
    }

    #[tokio::test]
    async fn failed_extraction_leaves_nothing_behind() {
        let h = harness(
            FakeVideos::default(),
            FakeChannels::default(),
            Extraction::FailHalfway,
        );
        let reply = text(
            h.dispatcher
                .run(Command::Extract { url: URL.to_owned() })
                .await,
        );
        assert!(reply.contains("unavailable or private"));
        assert!(!h.extractor.dirs.lock().unwrap()[0].exists());
    }

    #[tokio::test]
    async fn stuck_extraction_times_out_and_cleans_up() {
        let h = harness(
            FakeVideos::default(),
            FakeChannels::default(),
            Extraction::Hang,
        );
        let reply = text(
            h.dispatcher
                .run(Command::Extract { url: URL.to_owned() })
                .await,
        );
        assert!(reply.contains("could not be reached"));
        assert!(!h.extractor.dirs.lock().unwrap()[0].exists());
    }

    #[test]
    fn every_error_kind_has_a_message() {
        for e in [
            AdapterError::NotFound(String::new()),
            AdapterError::QuotaExceeded(String::new()),
            AdapterError::UpstreamUnavailable(String::new()),
            AdapterError::MalformedInput("bad".to_owned()),
        ] {
            assert!(user_message(&e).starts_with('\u{274C}'));
        }
    }
}
