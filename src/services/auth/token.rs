//! Credential extraction and *unverified* header decoding.
//!
//! Nothing in here trusts the token. The only output is the pair of strings
//! (`kid`, `alg`) the gate needs to pick a key; claims are never read here.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::services::auth::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingCredential)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Header fields of a JWS, as presented by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedHeader {
    pub kid: String,
    // Kept as the raw string: `none` and unknown values must survive decoding
    // so the verifier can reject them as an algorithm problem.
    pub alg: String,
    pub typ: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    typ: Option<String>,
}

impl UnverifiedHeader {
    /// Decode the header of a compact JWS and check the token shape.
    ///
    /// Fails with `MalformedToken` when the token is not three dot-separated
    /// segments, header or payload is not a base64url JSON object, the
    /// signature is not base64url, or `kid`/`alg` are missing. The payload
    /// is only checked for shape; its claims are not read here.
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken("expected three segments"));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(AuthError::MalformedToken("empty segment"));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| AuthError::MalformedToken("header is not base64url"))?;

        let raw: RawHeader = serde_json::from_slice(&bytes)
            .map_err(|_| AuthError::MalformedToken("header is not a json object"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken("payload is not base64url"))?;
        serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&payload)
            .map_err(|_| AuthError::MalformedToken("payload is not a json object"))?;

        // may be empty (`alg: none`); the verifier rejects that case
        URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken("signature is not base64url"))?;

        let kid = raw
            .kid
            .filter(|kid| !kid.trim().is_empty())
            .ok_or(AuthError::MalformedToken("missing kid"))?;

        let alg = raw.alg.ok_or(AuthError::MalformedToken("missing alg"))?;

        Ok(Self {
            kid,
            alg,
            typ: raw.typ,
        })
    }
}
