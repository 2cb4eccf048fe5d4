//! Builds the structured message for each kind of lookup result

use crate::{
    action::Action,
    classifier::DISCLAIMER,
    helper::{count_or_na, date_or_unknown, format_duration},
    model::{ChannelRecord, LicenseVerdict, TrackRecord, VideoRecord, VideoRef},
    render::{Payload, NEUTRAL_GREY, SPOTIFY_GREEN, YOUTUBE_RED},
    video_url::VideoId,
};

fn status(verdict: &LicenseVerdict) -> &'static str {
    if verdict.is_likely_restricted {
        "\u{1F512} Likely copyrighted"
    } else {
        "\u{2705} Likely free to use"
    }
}

pub fn video(record: &VideoRecord, description_budget: usize) -> Payload {
    let description = if record.description.trim().is_empty() {
        "No description"
    } else {
        record.description.as_str()
    };

    let mut payload = Payload::new(&record.title, YOUTUBE_RED)
        .url(&record.source_url)
        .description(description, description_budget)
        .thumbnail(record.thumbnail_url.clone())
        .field("Channel", &record.channel_name, true)
        .field("Published", date_or_unknown(record.published_at), true)
        .field("Duration", format_duration(record.duration_seconds), true)
        .field("Views", count_or_na(record.view_count), true)
        .field("Likes", count_or_na(record.like_count), true)
        .field("Comments", count_or_na(record.comment_count), true)
        .field(
            "Channel subscribers",
            count_or_na(record.channel_subscriber_count),
            true,
        )
        .field("Channel videos", count_or_na(record.channel_video_count), true)
        .link_button("Watch on YouTube", &record.source_url);

    if let Some(id) = VideoId::from_raw(&record.id) {
        payload = payload
            .action_button("Check license", Action::CheckVideo(id.clone()))
            .action_button("Thumbnail", Action::ShowThumbnail(id));
    }
    payload
}

pub fn video_check(record: &VideoRecord, verdict: &LicenseVerdict) -> Payload {
    let mut payload = Payload::new("YouTube Video Information", YOUTUBE_RED)
        .url(&record.source_url)
        .description(&format!("[Watch on YouTube]({})", record.source_url), 300)
        .thumbnail(record.thumbnail_url.clone())
        .field("Title", &record.title, false)
        .field("Channel", &record.channel_name, true)
        .field("License", &record.license_label, true)
        .field("Status", status(verdict), true)
        .field("Based on", verdict.basis.describe(), true)
        .footer(DISCLAIMER)
        .link_button("Watch on YouTube", &record.source_url);

    if let Some(id) = VideoId::from_raw(&record.id) {
        payload = payload.action_button("Full details", Action::ShowVideo(id));
    }
    payload
}

pub fn track_check(track: &TrackRecord, verdict: &LicenseVerdict) -> Payload {
    let copyright = if track.copyright_text.trim().is_empty() {
        "Not listed"
    } else {
        track.copyright_text.as_str()
    };

    Payload::new("Spotify Track Information", SPOTIFY_GREEN)
        .url(&track.catalog_url)
        .description(&format!("[Listen on Spotify]({})", track.catalog_url), 300)
        .thumbnail(track.thumbnail_url.clone())
        .field("Title", &track.title, false)
        .field("Artist(s)", track.artist_names.join(", "), true)
        .field("Album", &track.album_name, true)
        .field("Release Date", &track.release_date, true)
        .field("Copyright", copyright, false)
        .field("Status", status(verdict), true)
        .field("Based on", verdict.basis.describe(), true)
        .footer(DISCLAIMER)
        .link_button("Listen on Spotify", &track.catalog_url)
}

fn video_link(video: Option<&VideoRef>) -> String {
    match video {
        Some(video) => format!("[{}]({})", video.title, video.url()),
        None => "None".to_owned(),
    }
}

pub fn channel(
    channel: &ChannelRecord,
    latest: Option<&VideoRef>,
    most_viewed: Option<&VideoRef>,
    description_budget: usize,
) -> Payload {
    let description = if channel.description.trim().is_empty() {
        "No description"
    } else {
        channel.description.as_str()
    };

    let mut payload = Payload::new(&channel.title, YOUTUBE_RED)
        .url(channel.url())
        .description(description, description_budget)
        .thumbnail(channel.profile_image_url.clone())
        .image(channel.banner_image_url.clone())
        .field("Subscribers", count_or_na(channel.subscriber_count), true)
        .field("Total views", count_or_na(channel.view_count), true)
        .field("Videos", count_or_na(channel.video_count), true)
        .field("Created", date_or_unknown(channel.created_at), true)
        .field("Channel ID", format!("`{}`", channel.id), true)
        .field("Latest upload", video_link(latest), false)
        .field("Most viewed", video_link(most_viewed), false)
        .link_button("Open channel", channel.url());

    for (label, video) in [("Latest upload", latest), ("Most viewed", most_viewed)] {
        if let Some(id) = video.and_then(|v| VideoId::from_raw(&v.id)) {
            payload = payload.action_button(label, Action::ShowVideo(id));
        }
    }
    payload
}

pub fn thumbnail(id: &VideoId) -> Payload {
    Payload::new("Video thumbnail", NEUTRAL_GREY)
        .url(id.canonical_url())
        .description(
            &format!(
                "[Full resolution]({}) \u{00B7} [Fallback]({})",
                id.thumbnail_url(),
                id.fallback_thumbnail_url()
            ),
            300,
        )
        .image(Some(id.thumbnail_url()))
        .link_button("Open video", id.canonical_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::tests::sample_record, classifier::classify_video, render::Button};

    #[test]
    fn video_fields_are_formatted() {
        let record = sample_record("dQw4w9WgXcQ");
        let payload = video(&record, 300);

        let get = |name: &str| {
            payload
                .fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.value.clone())
                .unwrap()
        };
        assert_eq!(get("Views"), "1,234,567");
        assert_eq!(get("Comments"), "N/A");
        assert_eq!(get("Duration"), "1:02:03");
        assert_eq!(get("Channel subscribers"), "42,000");
        assert_eq!(payload.buttons.len(), 3);
    }

    #[test]
    fn video_description_respects_budget() {
        let mut record = sample_record("dQw4w9WgXcQ");
        record.description = "word ".repeat(200);
        let payload = video(&record, 50);
        let description = payload.description.unwrap();
        assert!(description.chars().count() <= 50);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn check_carries_disclaimer() {
        let record = sample_record("dQw4w9WgXcQ");
        let payload = video_check(&record, &classify_video(&record));
        assert_eq!(payload.footer.as_deref(), Some(DISCLAIMER));
        assert!(payload
            .fields
            .iter()
            .any(|f| f.name == "Status" && f.value.contains("free to use")));
    }

    #[test]
    fn channel_links_ranked_videos() {
        let record = ChannelRecord {
            id: "UCuAXFkgsw1L7xaCfnd5JJOw".to_owned(),
            title: "Rick Astley".to_owned(),
            description: String::new(),
            subscriber_count: Some(4_000_000),
            view_count: None,
            video_count: Some(300),
            created_at: None,
            profile_image_url: None,
            banner_image_url: Some("https://yt3.ggpht.com/banner".to_owned()),
        };
        let latest = VideoRef {
            id: "aaaaaaaaaaa".to_owned(),
            title: "New one".to_owned(),
        };
        let payload = channel(&record, Some(&latest), None, 300);

        let names: Vec<_> = payload.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Subscribers",
                "Total views",
                "Videos",
                "Created",
                "Channel ID",
                "Latest upload",
                "Most viewed"
            ]
        );
        assert_eq!(
            payload.fields[5].value,
            "[New one](https://www.youtube.com/watch?v=aaaaaaaaaaa)"
        );
        assert_eq!(payload.fields[6].value, "None");
        assert_eq!(payload.image.as_deref(), Some("https://yt3.ggpht.com/banner"));
        assert!(matches!(
            &payload.buttons[1],
            Button::Action { action: Action::ShowVideo(id), .. } if id.as_str() == "aaaaaaaaaaa"
        ));
    }
}
