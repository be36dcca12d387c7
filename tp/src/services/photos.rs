//! Stock photo fetching with a local cache
//!
//! Cache-or-fetch against the Unsplash search API. Everything here is
//! best-effort: a missing key, a failed search or a failed download all
//! degrade to "no image", never to an error the caller must handle.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PhotoConfig;
use crate::domain::TripDestinations;

const BASE_URL: &str = "https://api.unsplash.com";

/// Concurrent downloads per batch
const MAX_PARALLEL_DOWNLOADS: usize = 5;

/// Queries fetched per destination batch
const MAX_DESTINATION_QUERIES: usize = 10;

/// Stable non-cryptographic hash for cache keys
fn cache_hash(data: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

/// Image search queries for a set of detected destinations
///
/// Deduplicated case-insensitively in order, generic fallbacks when nothing
/// was detected, capped at a small batch.
pub fn destination_queries(destinations: &TripDestinations) -> Vec<String> {
    let mut queries: Vec<String> = destinations
        .all_destinations()
        .iter()
        .flat_map(|d| d.to_image_queries())
        .collect();

    if queries.is_empty() {
        queries = vec![
            "travel adventure".to_string(),
            "vacation landscape".to_string(),
            "family travel".to_string(),
        ];
    }

    let mut seen = Vec::new();
    let mut unique = Vec::new();
    for query in queries {
        let lower = query.to_lowercase();
        if !seen.contains(&lower) {
            seen.push(lower);
            unique.push(query);
        }
    }

    unique.truncate(MAX_DESTINATION_QUERIES);
    unique
}

/// Unsplash-backed photo service with a local file cache
pub struct PhotoService {
    access_key: String,
    cache_dir: PathBuf,
    http: Client,
}

impl PhotoService {
    pub fn new(access_key: impl Into<String>, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            access_key: access_key.into(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build a service from config; a missing access key yields a service
    /// whose fetches all miss
    pub fn from_config(config: &PhotoConfig) -> Self {
        let access_key = std::env::var(&config.access_key_env).unwrap_or_default();
        Self::new(access_key, &config.cache_dir)
    }

    /// Cache path for a query: sanitized prefix plus short stable hash
    fn cache_path(&self, query: &str, size: &str) -> PathBuf {
        let hash = format!("{:x}", cache_hash(&format!("{}_{}", query, size)));
        let safe: String = query
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .take(30)
            .collect();
        self.cache_dir.join(format!("{}_{}.jpg", safe, hash))
    }

    /// Search for one photo; None on any failure
    async fn search_photo(&self, query: &str, orientation: &str) -> Option<serde_json::Value> {
        if self.access_key.is_empty() {
            debug!("No Unsplash access key, skipping search");
            return None;
        }

        let response = self
            .http
            .get(format!("{}/search/photos", BASE_URL))
            .query(&[("query", query), ("orientation", orientation), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            warn!(status = %response.status(), %query, "Photo search failed");
            return None;
        }

        let data: serde_json::Value = response.json().await.ok()?;
        data["results"].as_array()?.first().cloned()
    }

    /// Search and download one photo, caching locally
    pub async fn download_photo(&self, query: &str) -> Option<PathBuf> {
        let size = "regular";
        let cache_path = self.cache_path(query, size);

        if cache_path.exists() {
            debug!(%query, "Photo cache hit");
            return Some(cache_path);
        }

        let photo = self.search_photo(query, "landscape").await?;
        let image_url = photo["urls"][size]
            .as_str()
            .or_else(|| photo["urls"]["regular"].as_str())?
            .to_string();

        let response = self.http.get(&image_url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let bytes = response.bytes().await.ok()?;

        if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
            warn!(error = %e, "Failed to create image cache directory");
            return None;
        }
        if let Err(e) = std::fs::write(&cache_path, &bytes) {
            warn!(error = %e, "Failed to write cached image");
            return None;
        }

        debug!(%query, path = %cache_path.display(), "Photo cached");
        Some(cache_path)
    }

    /// Download photos for the given queries, a few at a time
    ///
    /// Returns paths in query order; failed queries are dropped, so the
    /// result may be shorter than `max_images`.
    pub async fn fetch_for_queries(&self, queries: &[String], max_images: usize) -> Vec<PathBuf> {
        let batch: Vec<&String> = queries.iter().take(max_images).collect();
        if batch.is_empty() {
            return Vec::new();
        }

        futures::stream::iter(batch.into_iter().map(|query| self.download_photo(query)))
            .buffered(MAX_PARALLEL_DOWNLOADS)
            .collect::<Vec<Option<PathBuf>>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Fetch a photo batch for the detected destinations
    pub async fn fetch_for_destinations(&self, destinations: &TripDestinations) -> Vec<PathBuf> {
        let queries = destination_queries(destinations);
        let max = queries.len();
        self.fetch_for_queries(&queries, max).await
    }
}
