//! Signing-key cache keyed by `kid`.
//!
//! The cache is injected into the gate, never global. Two backends:
//! - `MemoryKeyCache`: per-process map (default)
//! - `ValkeyKeyCache`: shared across instances through a `CacheClient`
//!
//! A cache failure is never an authentication failure by itself; the worst
//! case is an extra key-set fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::jwk::Jwk;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::cache::{CacheClient, ValkeyClient};

/// Key material plus the time it was fetched from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedKey {
    pub jwk: Jwk,
    pub fetched_at: DateTime<Utc>,
}

impl CachedKey {
    pub fn new(jwk: Jwk) -> Self {
        Self {
            jwk,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // A fetch time in the future (clock step) counts as fresh.
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .is_ok_and(|age| age > ttl)
    }
}

#[async_trait]
pub trait KeyCache: Send + Sync {
    // Returns a fresh entry, or None on miss/expiry/backend error.
    async fn get(&self, kid: &str) -> Option<CachedKey>;

    async fn insert(&self, kid: &str, key: CachedKey);
}

/// In-process cache. Lookups never hold a lock across an `.await`.
#[derive(Debug, Clone)]
pub struct MemoryKeyCache {
    entries: Arc<DashMap<String, CachedKey>>,
    ttl: Duration,
}

impl MemoryKeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.entries.contains_key(kid)
    }

    // Re-checked under the shard lock: a concurrent insert may already have
    // replaced the stale entry with a fresh one.
    fn evict_expired(&self, kid: &str, now: DateTime<Utc>) {
        self.entries
            .remove_if(kid, |_, entry| entry.is_expired(self.ttl, now));
    }
}

#[async_trait]
impl KeyCache for MemoryKeyCache {
    async fn get(&self, kid: &str) -> Option<CachedKey> {
        let now = Utc::now();
        let hit = self.entries.get(kid).map(|entry| entry.value().clone())?;

        if hit.is_expired(self.ttl, now) {
            self.evict_expired(kid, now);
            return None;
        }

        Some(hit)
    }

    async fn insert(&self, kid: &str, key: CachedKey) {
        self.entries.insert(kid.to_string(), key);
    }
}

/// Cache shared through Valkey; entries expire server-side (`SET .. EX ttl`).
#[derive(Clone)]
pub struct ValkeyKeyCache<C: CacheClient = ValkeyClient> {
    client: C,
    // Optional key prefix to avoid collisions across environments
    prefix: String,
    ttl: Duration,
}

impl ValkeyKeyCache<ValkeyClient> {
    pub async fn connect(
        redis_url: &str,
        ttl: Duration,
    ) -> Result<Self, crate::services::cache::CacheError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_client(client, "auth:jwks", ttl))
    }
}

impl<C: CacheClient> ValkeyKeyCache<C> {
    pub fn new_with_client(client: C, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, kid: &str) -> String {
        format!("{}:{}", self.prefix, kid)
    }
}

#[async_trait]
impl<C: CacheClient> KeyCache for ValkeyKeyCache<C> {
    async fn get(&self, kid: &str) -> Option<CachedKey> {
        let raw = match self.client.get_string(&self.key(kid)).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, backend = self.client.backend_name(), "key cache read failed");
                return None;
            }
        };

        match serde_json::from_str::<CachedKey>(&raw) {
            Ok(key) if !key.is_expired(self.ttl, Utc::now()) => Some(key),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, kid, "discarding undecodable cached key");
                None
            }
        }
    }

    async fn insert(&self, kid: &str, key: CachedKey) {
        let value = match serde_json::to_string(&key) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, kid, "failed to encode key for cache");
                return;
            }
        };

        if let Err(err) = self
            .client
            .set_with_ttl(&self.key(kid), &value, self.ttl)
            .await
        {
            warn!(error = %err, backend = self.client.backend_name(), "key cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::client::{CacheError, CacheResult};

    fn sample_jwk(kid: &str) -> Jwk {
        serde_json::from_value(serde_json::json!({
            "kty": "RSA",
            "kid": kid,
            "alg": "RS256",
            "use": "sig",
            "n": "sXchDaQebHnPiGvyDOAT4saGEUetSyo9MKLOoWFsueri23bOdgWp4Dy1WlUzewbgBHod5pcM9H95GQRV3JDXboIRROSBigeC5yjU1hGzHHyXss8UDprecbAYxknTcQkhslANGRUZmdTOQ5qTRsLAt6BTYuyvVRdhS8exSZEy_c4gs_7svlJJQ4H9_NxsiIoLwAEk7-Q3UXERGYw_75IDrGA84-lA_-Ct4eTlXHBIY2EaV7t7LjJaynVJCpkv4LKjTTAumiGUIuQhrNhZLuF_RJLqHpM2kgWFLU7-VTdL1VbC2tejvcI2BlMkEpk1BzBZI0KQB0GaDWFLN-aEAw3vRw",
            "e": "AQAB"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn memory_cache_round_trips_fresh_entries() {
        let cache = MemoryKeyCache::new(Duration::from_secs(60));
        assert!(cache.get("k1").await.is_none());

        cache.insert("k1", CachedKey::new(sample_jwk("k1"))).await;

        let hit = cache.get("k1").await.expect("cached");
        assert_eq!(hit.jwk.common.key_id.as_deref(), Some("k1"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn memory_cache_drops_expired_entries() {
        let cache = MemoryKeyCache::new(Duration::from_secs(60));
        let stale = CachedKey {
            jwk: sample_jwk("k1"),
            fetched_at: Utc::now() - chrono::Duration::seconds(120),
        };
        cache.insert("k1", stale).await;

        assert!(cache.get("k1").await.is_none());
        assert!(!cache.contains("k1"));
    }

    #[tokio::test]
    async fn eviction_keeps_an_entry_refreshed_in_between() {
        let cache = MemoryKeyCache::new(Duration::from_secs(60));
        let now = Utc::now();

        // stale read happened, then another task stored a fresh key
        cache.insert("k1", CachedKey::new(sample_jwk("k1"))).await;
        cache.evict_expired("k1", now);
        assert!(cache.contains("k1"));

        let stale = CachedKey {
            jwk: sample_jwk("k1"),
            fetched_at: now - chrono::Duration::seconds(120),
        };
        cache.insert("k1", stale).await;
        cache.evict_expired("k1", now);
        assert!(!cache.contains("k1"));
    }

    #[test]
    fn future_fetch_time_is_not_expired() {
        let key = CachedKey {
            jwk: sample_jwk("k1"),
            fetched_at: Utc::now() + chrono::Duration::seconds(30),
        };
        assert!(!key.is_expired(Duration::from_secs(1), Utc::now()));
    }

    #[derive(Clone, Default)]
    struct FakeClient {
        values: Arc<DashMap<String, String>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheClient for FakeClient {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            if self.broken {
                return Err(CacheError::BackendConnection("down".into()));
            }
            Ok(self.values.get(key).map(|v| v.value().clone()))
        }

        async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
            if self.broken {
                return Err(CacheError::BackendConnection("down".into()));
            }
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn valkey_cache_stores_json_under_prefixed_key() {
        let client = FakeClient::default();
        let cache = ValkeyKeyCache::new_with_client(client.clone(), "test:jwks", Duration::from_secs(60));

        cache.insert("k1", CachedKey::new(sample_jwk("k1"))).await;

        assert!(client.values.contains_key("test:jwks:k1"));
        let hit = cache.get("k1").await.expect("cached");
        assert_eq!(hit.jwk, sample_jwk("k1"));
    }

    #[tokio::test]
    async fn valkey_cache_treats_garbage_and_backend_errors_as_miss() {
        let client = FakeClient::default();
        client.values.insert("test:jwks:k1".into(), "{not json".into());
        let cache = ValkeyKeyCache::new_with_client(client, "test:jwks", Duration::from_secs(60));
        assert!(cache.get("k1").await.is_none());

        let broken = FakeClient {
            broken: true,
            ..FakeClient::default()
        };
        let cache = ValkeyKeyCache::new_with_client(broken, "test:jwks", Duration::from_secs(60));
        cache.insert("k1", CachedKey::new(sample_jwk("k1"))).await;
        assert!(cache.get("k1").await.is_none());
    }
}
