//! Factory: build the `BearerGate` from application `Config`.
use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Config, KeyCacheBackend};
use crate::error::AppError;
use crate::services::auth::BearerGate;
use crate::services::auth::key_cache::{KeyCache, MemoryKeyCache, ValkeyKeyCache};
use crate::services::auth::key_set::HttpKeySet;

pub async fn build_bearer_gate(config: &Config) -> Result<Arc<BearerGate>, AppError> {
    let source = HttpKeySet::new(&config.auth_jwks_url, config.jwks_fetch_timeout).map_err(|e| {
        error!(error = %e, "invalid key set endpoint");
        AppError::Internal
    })?;

    let cache: Arc<dyn KeyCache> = match config.key_cache_backend {
        KeyCacheBackend::Memory => Arc::new(MemoryKeyCache::new(config.jwks_cache_ttl)),
        KeyCacheBackend::Valkey => {
            let url = config.valkey_url.as_deref().ok_or(AppError::Internal)?;
            let cache = ValkeyKeyCache::connect(url, config.jwks_cache_ttl)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to connect key cache backend");
                    AppError::Internal
                })?;
            Arc::new(cache)
        }
    };

    info!(
        jwks_url = %source.url(),
        cache = ?config.key_cache_backend,
        algorithms = ?config.auth_allowed_algorithms,
        "bearer gate configured"
    );

    Ok(Arc::new(BearerGate::new(
        Arc::new(source),
        cache,
        config.jwks_fetch_timeout,
        config.verifier_policy(),
    )))
}
