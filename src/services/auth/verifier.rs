//! Signature and claim verification against an already resolved key.
//!
//! `jsonwebtoken::Validation` checks:
//! - signature (for the single algorithm we hand it)
//! - `exp` / `nbf` with leeway
//! - `iss` / `aud` when configured
//!
//! Before that, this module enforces the algorithm allow-list and that the key
//! type belongs to the token's algorithm family. `none` and `HS*` never pass.

use std::str::FromStr;

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::services::auth::claims::VerifiedClaims;
use crate::services::auth::error::InvalidTokenReason;
use crate::services::auth::token::UnverifiedHeader;

/// Verification knobs, built from `Config`.
#[derive(Debug, Clone)]
pub struct VerifierPolicy {
    pub allowed_algorithms: Vec<Algorithm>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            allowed_algorithms: vec![Algorithm::RS256],
            issuer: None,
            audience: None,
            leeway_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    policy: VerifierPolicy,
}

impl TokenVerifier {
    pub fn new(policy: VerifierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VerifierPolicy {
        &self.policy
    }

    pub fn verify(
        &self,
        token: &str,
        header: &UnverifiedHeader,
        jwk: &Jwk,
    ) -> Result<VerifiedClaims, InvalidTokenReason> {
        let alg = self.allowed_algorithm(&header.alg)?;

        if !key_fits_algorithm(jwk, alg) {
            return Err(InvalidTokenReason::KeyMismatch);
        }

        // A key that pins its algorithm must be used with exactly that one.
        if let Some(key_alg) = &jwk.common.key_algorithm
            && !key_alg_matches(key_alg, &header.alg)
        {
            return Err(InvalidTokenReason::KeyMismatch);
        }

        let key = DecodingKey::from_jwk(jwk).map_err(InvalidTokenReason::UnusableKey)?;

        let data = jsonwebtoken::decode::<VerifiedClaims>(token, &key, &self.validation(alg))?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(InvalidTokenReason::EmptyClaim("sub"));
        }

        Ok(claims)
    }

    fn allowed_algorithm(&self, alg: &str) -> Result<Algorithm, InvalidTokenReason> {
        Algorithm::from_str(alg)
            .ok()
            .filter(|alg| self.policy.allowed_algorithms.contains(alg))
            .ok_or_else(|| InvalidTokenReason::DisallowedAlgorithm(alg.to_string()))
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.policy.leeway_seconds;
        validation.validate_nbf = true;

        // jsonwebtoken only compares `iss` / `aud` when present; a configured
        // value makes the claim mandatory.
        let mut required = vec!["exp", "sub"];
        if self.policy.issuer.is_some() {
            required.push("iss");
        }
        if self.policy.audience.is_some() {
            required.push("aud");
        }
        validation.set_required_spec_claims(&required);

        if let Some(issuer) = &self.policy.issuer {
            validation.set_issuer(&[issuer]);
        }

        match &self.policy.audience {
            Some(audience) => validation.set_audience(&[audience]),
            // Providers put their own values in `aud` (e.g. "account"); without
            // a configured audience there is nothing to compare against.
            None => validation.validate_aud = false,
        }

        validation
    }
}

/// True for asymmetric algorithms only.
pub fn is_asymmetric(alg: Algorithm) -> bool {
    !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

// Compares the JWK `alg` by its JOSE name (serde form), e.g. "RS256".
fn key_alg_matches(key_alg: &KeyAlgorithm, alg: &str) -> bool {
    matches!(serde_json::to_value(key_alg), Ok(serde_json::Value::String(name)) if name == alg)
}

fn key_fits_algorithm(jwk: &Jwk, alg: Algorithm) -> bool {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512
        ),
        AlgorithmParameters::EllipticCurve(params) => matches!(
            (&params.curve, alg),
            (EllipticCurve::P256, Algorithm::ES256) | (EllipticCurve::P384, Algorithm::ES384)
        ),
        AlgorithmParameters::OctetKeyPair(params) => {
            matches!((&params.curve, alg), (EllipticCurve::Ed25519, Algorithm::EdDSA))
        }
        // Shared secrets (`oct`) have no place in a public key set.
        _ => false,
    }
}
