use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/tubebot/config.toml";
const CACHE_PATH_REL_HOME: &str = ".config/tubebot/video_cache.json";

/// Bot configuration
///
/// Every section is optional in the file.  Secrets may instead come from the environment, which
/// wins over the file.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub youtube: YouTube,
    pub spotify: Spotify,
    pub cache: Cache,
    pub extract: Extract,
    pub limits: Limits,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct General {
    pub discord_token: String,
    pub command_prefix: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            command_prefix: "!".to_owned(),
        }
    }
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct YouTube {
    pub api_key: String,
    pub metadata_backend: MetadataBackend,
}

/// Where video metadata comes from.  Channel lookups always use the Data API.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataBackend {
    #[default]
    Api,
    YtDlp,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Spotify {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Cache {
    /// Defaults to `~/.config/tubebot/video_cache.json`
    pub path: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Extract {
    pub yt_dlp_path: String,
    pub audio_format: String,
    /// Largest file we will try to upload.  Servers without boosts accept 10 MiB.
    pub max_upload_bytes: u64,
}

impl Default for Extract {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_owned(),
            audio_format: "mp3".to_owned(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    pub command_timeout_seconds: u64,
    pub extract_timeout_seconds: u64,
    /// Characters of free-text description shown before cutting with `...`
    pub description_budget: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            command_timeout_seconds: 30,
            extract_timeout_seconds: 180,
            description_budget: 300,
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    /// Load from the default location, apply environment overrides and check that every secret
    /// is present.  A missing file is fine as long as the environment supplies the secrets.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path).await?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    async fn load_from(path: &Path) -> Result<Self> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::log_internal!(
                    "No configuration at `{}`, using defaults",
                    path.to_string_lossy()
                );
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(anyhow!(
                    "Could not open configuration at `{}`: {}",
                    path.to_string_lossy(),
                    e
                ))
            }
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    /// Overwrite secrets with environment variables where set and non-empty.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut String); 4] = [
            ("DISCORD_TOKEN", &mut self.general.discord_token),
            ("YOUTUBE_API_KEY", &mut self.youtube.api_key),
            ("SPOTIFY_CLIENT_ID", &mut self.spotify.client_id),
            ("SPOTIFY_CLIENT_SECRET", &mut self.spotify.client_secret),
        ];
        for (name, field) in overrides {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    /// Fail before connecting to anything if a secret is missing, naming all of them at once.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("general.discord_token / DISCORD_TOKEN", &self.general.discord_token),
            ("youtube.api_key / YOUTUBE_API_KEY", &self.youtube.api_key),
            ("spotify.client_id / SPOTIFY_CLIENT_ID", &self.spotify.client_id),
            (
                "spotify.client_secret / SPOTIFY_CLIENT_SECRET",
                &self.spotify.client_secret,
            ),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            bail!("Missing required secrets: {}", missing.join(", "));
        }
        if self.general.command_prefix.is_empty() {
            bail!("general.command_prefix must not be empty");
        }
        Ok(())
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache.path {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|p| p.join(CACHE_PATH_REL_HOME))
                .ok_or(anyhow!("Could not find home directory")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secrets() -> Config {
        let mut cfg = Config::default();
        cfg.apply_env(|name| Some(format!("env-{}", name)));
        cfg
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.general.command_prefix, "!");
        assert_eq!(cfg.youtube.metadata_backend, MetadataBackend::Api);
        assert_eq!(cfg.extract.yt_dlp_path, "yt-dlp");
        assert_eq!(cfg.extract.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.limits.command_timeout_seconds, 30);
        assert_eq!(cfg.limits.description_budget, 300);
        assert!(cfg.cache.path.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [general]
            discord_token = "abc"

            [youtube]
            metadata_backend = "yt-dlp"

            [limits]
            description_budget = 120

            [cache]
            path = "/tmp/videos.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.general.discord_token, "abc");
        assert_eq!(cfg.general.command_prefix, "!");
        assert_eq!(cfg.youtube.metadata_backend, MetadataBackend::YtDlp);
        assert_eq!(cfg.limits.description_budget, 120);
        assert_eq!(cfg.limits.extract_timeout_seconds, 180);
        assert_eq!(
            cfg.cache_path().unwrap(),
            PathBuf::from("/tmp/videos.json")
        );
    }

    #[test]
    fn environment_wins_over_file() {
        let mut cfg: Config = toml::from_str(
            r#"
            [general]
            discord_token = "from-file"
            [spotify]
            client_id = "file-id"
            "#,
        )
        .unwrap();
        cfg.apply_env(|name| match name {
            "DISCORD_TOKEN" => Some("from-env".to_owned()),
            "SPOTIFY_CLIENT_ID" => Some("  ".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.general.discord_token, "from-env");
        assert_eq!(cfg.spotify.client_id, "file-id");
    }

    #[test]
    fn validation_names_every_missing_secret() {
        let mut cfg = Config::default();
        cfg.general.discord_token = "token".to_owned();
        let err = cfg.validate().unwrap_err().to_string();
        assert!(!err.contains("DISCORD_TOKEN"));
        assert!(err.contains("YOUTUBE_API_KEY"));
        assert!(err.contains("SPOTIFY_CLIENT_ID"));
        assert!(err.contains("SPOTIFY_CLIENT_SECRET"));

        assert!(with_secrets().validate().is_ok());
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml"))
            .await
            .unwrap();
        assert_eq!(cfg.general.command_prefix, "!");
    }

    #[tokio::test]
    async fn broken_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\n").unwrap();
        let err = Config::load_from(&path).await.unwrap_err().to_string();
        assert!(err.contains("config.toml"));
    }
}
