//! TTL cache for synthesized audio.
//!
//! Keyed by the xxh3 hash of the full SSML document (which embeds voice,
//! prosody and pause directives), so two identical replies in the same
//! session cost one synthesis call.

use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

const MAX_CACHED_ENTRIES: u64 = 256;

/// Async TTL cache for synthesis results.
pub struct SynthesisCache {
    cache: Cache<u64, Bytes>,
}

impl SynthesisCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_CACHED_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Look up cached audio for an SSML document.
    pub async fn get(&self, ssml: &str) -> Option<Bytes> {
        let hit = self.cache.get(&xxh3_64(ssml.as_bytes())).await;
        if hit.is_some() {
            debug!("synthesis cache hit");
        }
        hit
    }

    /// Store synthesized audio for an SSML document.
    pub async fn insert(&self, ssml: &str, audio: Bytes) {
        self.cache.insert(xxh3_64(ssml.as_bytes()), audio).await;
    }
}
