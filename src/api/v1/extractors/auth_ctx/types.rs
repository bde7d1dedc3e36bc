/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 署名検証・鍵解決は services::auth 側の責務
 */
use chrono::{DateTime, Utc};

use crate::services::auth::VerifiedClaims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `subject` はトークンの `sub`
/// - `claims` は検証済みクレーム全体 (プロバイダ固有のクレームを含む)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub subject: String,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub claims: VerifiedClaims,
}

impl From<VerifiedClaims> for AuthCtx {
    fn from(claims: VerifiedClaims) -> Self {
        // exp beyond chrono's range only happens with absurd tokens; clamp.
        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            subject: claims.sub.clone(),
            issuer: claims.iss.clone(),
            audience: claims.aud.as_ref().map(|aud| aud.to_vec()).unwrap_or_default(),
            expires_at,
            claims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn built_from_verified_claims() {
        let claims: VerifiedClaims = serde_json::from_value(json!({
            "sub": "alice",
            "exp": 1_900_000_000u64,
            "iss": "https://idp.example.com/realms/tasks",
            "aud": "task-api"
        }))
        .unwrap();

        let ctx = AuthCtx::from(claims);
        assert_eq!(ctx.subject, "alice");
        assert_eq!(ctx.audience, vec!["task-api".to_string()]);
        assert_eq!(ctx.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(ctx.claims.sub, "alice");
    }
}
