//! `kid` → signing key resolution (cache first, then the provider).

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use tracing::{debug, warn};

use crate::services::auth::error::KeyResolutionError;
use crate::services::auth::key_cache::{CachedKey, KeyCache};
use crate::services::auth::key_set::KeySetSource;

/// Bound on a single key-cache read or write. A slow backend counts as a miss.
const CACHE_OP_TIMEOUT: Duration = Duration::from_millis(500);

pub struct KeyResolver {
    source: Arc<dyn KeySetSource>,
    cache: Arc<dyn KeyCache>,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for KeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyResolver")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl KeyResolver {
    pub fn new(
        source: Arc<dyn KeySetSource>,
        cache: Arc<dyn KeyCache>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            fetch_timeout,
        }
    }

    /// Resolve the key for `kid`.
    ///
    /// No lock is held while fetching, so two requests missing on the same
    /// `kid` may both fetch. The fetch is read-only, the second write wins.
    pub async fn resolve(&self, kid: &str) -> Result<Jwk, KeyResolutionError> {
        match tokio::time::timeout(CACHE_OP_TIMEOUT, self.cache.get(kid)).await {
            Ok(Some(hit)) => {
                debug!(kid, "signing key cache hit");
                return Ok(hit.jwk);
            }
            Ok(None) => {}
            Err(_) => warn!(kid, "key cache read timed out"),
        }

        debug!(kid, "signing key cache miss");
        let set = self.fetch().await?;

        // Populate every keyed entry: a freshly rotated provider usually
        // publishes the next key alongside the current one.
        for jwk in &set.keys {
            if let Some(id) = jwk.common.key_id.as_deref() {
                let insert = self.cache.insert(id, CachedKey::new(jwk.clone()));
                if tokio::time::timeout(CACHE_OP_TIMEOUT, insert).await.is_err() {
                    warn!(kid = id, "key cache write timed out");
                }
            }
        }

        set.find(kid)
            .cloned()
            .ok_or_else(|| KeyResolutionError::UnknownKid(kid.to_string()))
    }

    async fn fetch(&self) -> Result<JwkSet, KeyResolutionError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(set)) => Ok(set),
            Ok(Err(err)) => {
                warn!(error = %err, "key set fetch failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(timeout = ?self.fetch_timeout, "key set fetch timed out");
                Err(KeyResolutionError::Timeout)
            }
        }
    }
}
