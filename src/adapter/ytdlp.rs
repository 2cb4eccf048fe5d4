//! yt-dlp subprocess adapter.  Extracts audio for `extract` and can also serve video metadata
//! when the Data API is not wanted.

use crate::{
    adapter::{AudioExtractor, VideoSource},
    error::{AdapterError, AdapterResult},
    log_internal,
    model::VideoRecord,
    video_url::VideoId,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Output,
};
use tokio::process::Command;

pub struct YtDlp {
    program: String,
    audio_format: String,
    max_upload_bytes: u64,
}

impl YtDlp {
    pub fn new(program: String, audio_format: String, max_upload_bytes: u64) -> Self {
        Self {
            program,
            audio_format,
            max_upload_bytes,
        }
    }

    async fn run(&self, args: &[&str]) -> AdapterResult<Output> {
        log_internal!("Running {} {}... ", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            // A per-command timeout drops this future; make sure the child goes with it.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    AdapterError::UpstreamUnavailable(format!("{} is not installed", self.program))
                }
                _ => AdapterError::UpstreamUnavailable(format!(
                    "could not run {}: {}",
                    self.program, e
                )),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        log_internal!("Running {} {}... done", self.program, args.join(" "));
        Ok(output)
    }
}

#[serenity::async_trait]
impl AudioExtractor for YtDlp {
    async fn extract_audio(&self, url: &str, dest_dir: &Path) -> AdapterResult<PathBuf> {
        let template = dest_dir.join("%(id)s.%(ext)s");
        let template = template.to_string_lossy();

        self.run(&[
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "--extract-audio",
            "--audio-format",
            self.audio_format.as_str(),
            "--output",
            &*template,
            url,
        ])
        .await?;

        let path = find_output(dest_dir).await?;

        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| AdapterError::UpstreamUnavailable(format!("extracted file vanished: {}", e)))?
            .len();
        if size > self.max_upload_bytes {
            return Err(AdapterError::UpstreamUnavailable(format!(
                "audio is {:.1} MiB, over the {:.1} MiB upload limit",
                size as f64 / 1_048_576.0,
                self.max_upload_bytes as f64 / 1_048_576.0
            )));
        }

        Ok(path)
    }
}

#[serenity::async_trait]
impl VideoSource for YtDlp {
    async fn video(&self, id: &VideoId) -> AdapterResult<VideoRecord> {
        let url = id.canonical_url();
        let output = self
            .run(&["--dump-json", "--no-playlist", "--skip-download", "--no-warnings", url.as_str()])
            .await?;

        let info: VideoInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
            AdapterError::UpstreamUnavailable(format!("unreadable yt-dlp output: {}", e))
        })?;

        if info.id != id.as_str() {
            return Err(AdapterError::UpstreamUnavailable(format!(
                "asked for video {} but got {}",
                id, info.id
            )));
        }

        Ok(video_record(info, id))
    }
}

/// The single finished file yt-dlp left behind.  Partial downloads are ignored.
async fn find_output(dir: &Path) -> AdapterResult<PathBuf> {
    let unavailable = |e: std::io::Error| {
        AdapterError::UpstreamUnavailable(format!("could not read extraction directory: {}", e))
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(unavailable)?;
    while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
        let path = entry.path();
        let partial = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("part") | Some("ytdl") | Some("tmp")
        );
        if !partial && entry.file_type().await.map_err(unavailable)?.is_file() {
            return Ok(path);
        }
    }

    Err(AdapterError::UpstreamUnavailable(
        "yt-dlp finished without producing a file".to_owned(),
    ))
}

fn classify_stderr(stderr: &str) -> AdapterError {
    let lower = stderr.to_lowercase();
    if lower.contains("ffmpeg") || lower.contains("ffprobe") {
        // Missing post-processor on the host, not a problem with the video.
        return AdapterError::UpstreamUnavailable(stderr.trim().to_owned());
    }
    if lower.contains("private video") || lower.contains("video unavailable") {
        return AdapterError::UpstreamUnavailable(stderr.trim().to_owned());
    }
    AdapterError::from_message(stderr.trim())
}

fn video_record(info: VideoInfo, id: &VideoId) -> VideoRecord {
    let published_at = info
        .upload_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Utc.from_utc_datetime(&d));

    // yt-dlp spells the license out in full, e.g. "Creative Commons Attribution license (reuse
    // allowed)".  Fold it into the same label the Data API adapter produces.
    let license_label = match info.license {
        Some(l) if l.to_lowercase().contains("creative commons") => "Creative Commons".to_owned(),
        Some(l) => l,
        None => "Standard YouTube License".to_owned(),
    };

    VideoRecord {
        id: info.id,
        title: info.title,
        description: info.description.unwrap_or_default(),
        channel_name: info
            .channel
            .or(info.uploader)
            .unwrap_or_else(|| "Unknown".to_owned()),
        published_at,
        view_count: info.view_count,
        like_count: info.like_count,
        comment_count: info.comment_count,
        duration_seconds: info.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
        channel_subscriber_count: info.channel_follower_count,
        channel_video_count: None,
        thumbnail_url: info.thumbnail,
        license_label,
        source_url: id.canonical_url(),
    }
}

#[derive(Deserialize)]
struct VideoInfo {
    id: String,
    title: String,
    description: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    /// `YYYYMMDD`
    upload_date: Option<String>,
    view_count: Option<u64>,
    like_count: Option<u64>,
    comment_count: Option<u64>,
    duration: Option<f64>,
    channel_follower_count: Option<u64>,
    thumbnail: Option<String>,
    license: Option<String>,
}
