/*
 * Responsibility
 * - Bearer gate の失敗分類 (4 種) と、その内訳
 * - HTTP には依存しない。status への変換は crate::error 側で行う
 */
use thiserror::Error;

use crate::services::auth::key_set::KeySetError;

/// Terminal outcome of a rejected request.
///
/// Every variant maps to 401 at the HTTP boundary; the distinction exists for
/// logs and for the `code` field of the error body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("key resolution failed: {0}")]
    KeyResolutionFailed(#[from] KeyResolutionError),

    #[error("invalid token: {0}")]
    InvalidToken(#[from] InvalidTokenReason),
}

impl AuthError {
    /// Stable machine-readable code (used in error bodies and log fields).
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::MalformedToken(_) => "MALFORMED_TOKEN",
            Self::KeyResolutionFailed(_) => "KEY_RESOLUTION_FAILED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
        }
    }
}

#[derive(Debug, Error)]
pub enum KeyResolutionError {
    #[error(transparent)]
    KeySet(#[from] KeySetError),

    #[error("key set fetch timed out")]
    Timeout,

    #[error("no key with kid '{0}' in key set")]
    UnknownKid(String),
}

#[derive(Debug, Error)]
pub enum InvalidTokenReason {
    #[error("algorithm '{0}' is not allowed")]
    DisallowedAlgorithm(String),

    // key type / declared alg of the JWK does not fit the token alg
    #[error("key does not match token algorithm")]
    KeyMismatch,

    #[error("unusable verification key: {0}")]
    UnusableKey(jsonwebtoken::errors::Error),

    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}
