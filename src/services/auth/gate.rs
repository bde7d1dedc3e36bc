//! Bearer-token admission gate.
//!
//! Per request:
//! `Received → CredentialExtracted → KeyResolving → KeyResolved → Verifying → Admitted`
//! with a terminal `Rejected` (one of the four `AuthError` kinds) possible at
//! every arrow. There is no retry inside a request.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::services::auth::claims::VerifiedClaims;
use crate::services::auth::error::AuthError;
use crate::services::auth::key_cache::KeyCache;
use crate::services::auth::key_set::KeySetSource;
use crate::services::auth::resolver::KeyResolver;
use crate::services::auth::token::{UnverifiedHeader, extract_bearer};
use crate::services::auth::verifier::{TokenVerifier, VerifierPolicy};

#[derive(Debug)]
pub struct BearerGate {
    resolver: KeyResolver,
    verifier: TokenVerifier,
}

impl BearerGate {
    pub fn new(
        source: Arc<dyn KeySetSource>,
        cache: Arc<dyn KeyCache>,
        fetch_timeout: Duration,
        policy: VerifierPolicy,
    ) -> Self {
        Self {
            resolver: KeyResolver::new(source, cache, fetch_timeout),
            verifier: TokenVerifier::new(policy),
        }
    }

    /// Authenticate from a raw `Authorization` header value.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<VerifiedClaims, AuthError> {
        let token = extract_bearer(authorization)?;
        let header = UnverifiedHeader::decode(token)?;

        let jwk = self.resolver.resolve(&header.kid).await?;
        let claims = self.verifier.verify(token, &header, &jwk)?;

        debug!(kid = %header.kid, sub = %claims.sub, "bearer token admitted");
        Ok(claims)
    }

    /// Same as [`authenticate`](Self::authenticate), reading the header map.
    ///
    /// A header value that is not visible ASCII counts as missing.
    pub async fn authenticate_headers(
        &self,
        headers: &HeaderMap,
    ) -> Result<VerifiedClaims, AuthError> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        self.authenticate(authorization).await
    }

    pub fn policy(&self) -> &VerifierPolicy {
        self.verifier.policy()
    }
}
