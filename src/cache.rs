use crate::{log_internal, model::VideoRecord};
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, io::ErrorKind, path::PathBuf};
use tokio::sync::Mutex;

/// Key-value store for previously fetched videos, keyed by canonical URL.
///
/// Entries never expire.  A record fetched once is served until the store is wiped, even if the
/// upstream counts or license change.
#[serenity::async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<VideoRecord>;
    async fn put(&self, key: &str, record: &VideoRecord) -> Result<()>;
}

/// What is persisted per key: the record itself plus when we stored it.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub value: VideoRecord,
    pub stored_at: DateTime<Utc>,
}

/// JSON file holding the whole cache.  Loaded into memory once and rewritten wholesale on every
/// `put`.  All access goes through one mutex, which also serializes writers, so two commands
/// storing at the same time can't interleave their file writes.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl JsonFileStore {
    pub async fn load(path: PathBuf) -> Result<Self> {
        let entries = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                anyhow!(
                    "Could not parse video cache at `{}`: {}",
                    path.to_string_lossy(),
                    e
                )
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(anyhow!(
                    "Could not read video cache at `{}`: {}",
                    path.to_string_lossy(),
                    e
                ))
            }
        };

        log_internal!(
            "Loaded {} cached video(s) from `{}`",
            entries.len(),
            path.to_string_lossy()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn save(&self, entries: &HashMap<String, CacheEntry>) -> Result<()> {
        let path = &self.path;
        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|e| anyhow!("Could not serialize video cache: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Create a temporary file in the same directory.
        let tmp_path = path.with_extension("json.new");

        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            anyhow!(
                "Could not write video cache to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        // Atomically rename the temporary file over the target file.
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}

#[serenity::async_trait]
impl MetadataStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<VideoRecord> {
        self.entries
            .lock()
            .await
            .get(key)
            .map(|entry| entry.value.clone())
    }

    async fn put(&self, key: &str, record: &VideoRecord) -> Result<()> {
        if record.source_url != key {
            bail!(
                "Refusing to cache `{}` under mismatched key `{}`",
                record.source_url,
                key
            );
        }

        let mut entries = self.entries.lock().await;
        let previous = entries.insert(
            key.to_owned(),
            CacheEntry {
                value: record.clone(),
                stored_at: Utc::now(),
            },
        );

        // Memory only ever holds what made it to disk.
        if let Err(e) = self.save(&entries).await {
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
