use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            subject: ctx.subject,
            issuer: ctx.issuer,
            audience: ctx.audience,
            expires_at: ctx.expires_at,
        }
    }
}
