//! Memo for skill suggestions.
//!
//! Values are opaque JSON strings. A cache error is logged and treated as a
//! miss: the caller then goes to the provider as if nothing were cached.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

pub const SUGGESTION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn suggestion_cache_key(industry: &str, role: &str) -> String {
    format!(
        "skills_{}_{}",
        industry.trim().to_lowercase(),
        role.trim().to_lowercase()
    )
}

#[async_trait]
pub trait SuggestionCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: String, ttl: Duration);
}

/// Production backend: `SET key value EX ttl`.
pub struct RedisSuggestionCache {
    client: redis::Client,
}

impl RedisSuggestionCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SuggestionCache for RedisSuggestionCache {
    async fn get(&self, key: &str) -> Option<String> {
        let result: redis::RedisResult<Option<String>> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut conn)
                .await
        }
        .await;

        match result {
            Ok(value) => value,
            Err(e) => {
                warn!(key, "suggestion cache read failed: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        let result: redis::RedisResult<()> = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs())
                .query_async::<_, ()>(&mut conn)
                .await
        }
        .await;

        if let Err(e) = result {
            warn!(key, "suggestion cache write failed: {e}");
        }
    }
}

/// In-process backend with tokio-clock expiry, used in tests and local runs.
#[derive(Default)]
pub struct MemorySuggestionCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

#[async_trait]
impl SuggestionCache for MemorySuggestionCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(key)
            .map(|(value, expires_at)| (Instant::now() < *expires_at).then(|| value.clone()));
        match fresh {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }
}
