//! Spotify Web API adapter (client credentials flow)

use crate::{
    adapter::TrackSource,
    error::{AdapterError, AdapterResult},
    log_internal,
    model::TrackRecord,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tokio::{sync::Mutex, time::Instant};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
/// Refresh this long before the token actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

pub struct SpotifyApi {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

impl AccessToken {
    /// A token granted at `now` for `expires_in` seconds, retired a margin before it lapses.
    fn granted(value: String, expires_in: u64, now: Instant) -> Self {
        let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            value,
            refresh_at: now + lifetime,
        }
    }

    fn usable_at(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

impl SpotifyApi {
    pub fn new(client: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    /// Bearer token, requesting a fresh one if the cached token is about to expire.
    async fn access_token(&self) -> AdapterResult<String> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref().filter(|t| t.usable_at(Instant::now())) {
            return Ok(token.value.clone());
        }

        log_internal!("Requesting Spotify access token... ");
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Bad credentials are a configuration problem, not something the user can fix.
            return Err(AdapterError::UpstreamUnavailable(format!(
                "token request failed: {} {}",
                status, body
            )));
        }

        let grant: TokenResponse = response.json().await?;
        log_internal!("Requesting Spotify access token... done");

        let fresh = AccessToken::granted(grant.access_token, grant.expires_in, Instant::now());
        let value = fresh.value.clone();
        *token = Some(fresh);
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AdapterResult<T> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", API_BASE, path);

        log_internal!("Spotify API {} {:?}... ", path, query);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::from_status(status, None, &body));
        }

        let parsed = response.json::<T>().await?;
        log_internal!("Spotify API {} {:?}... done", path, query);
        Ok(parsed)
    }
}

#[serenity::async_trait]
impl TrackSource for SpotifyApi {
    async fn search_track(&self, query: &str) -> AdapterResult<TrackRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdapterError::MalformedInput("empty search query".to_owned()));
        }

        let response: SearchResponse = self
            .get("search", &[("q", query), ("type", "track"), ("limit", "1")])
            .await?;

        let track = response
            .tracks
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::NotFound(format!("no track matches {:?}", query)))?;

        // Copyright lines live on the album, not the track.
        let album: Album = self.get(&format!("albums/{}", track.album.id), &[]).await?;

        Ok(track_record(track, &album))
    }
}

fn track_record(track: Track, album: &Album) -> TrackRecord {
    let copyright_text = album
        .copyrights
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    TrackRecord {
        id: track.id,
        title: track.name,
        artist_names: track.artists.into_iter().map(|a| a.name).collect(),
        album_name: track.album.name,
        release_date: track.album.release_date,
        catalog_url: track.external_urls.spotify,
        thumbnail_url: track.album.images.into_iter().next().map(|i| i.url),
        copyright_text,
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Paging<Track>,
}

#[derive(Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct Track {
    id: String,
    name: String,
    artists: Vec<Artist>,
    album: SimplifiedAlbum,
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct SimplifiedAlbum {
    id: String,
    name: String,
    #[serde(default)]
    release_date: String,
    /// Widest first
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Deserialize)]
struct Image {
    url: String,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[derive(Deserialize)]
struct Album {
    #[serde(default)]
    copyrights: Vec<Copyright>,
}

#[derive(Deserialize)]
struct Copyright {
    text: String,
}
