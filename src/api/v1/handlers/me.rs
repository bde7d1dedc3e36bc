/*
 * Responsibility
 * - GET /me: 検証済みトークンから得た主体情報を返す
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(auth): AuthCtxExtractor) -> Json<MeResponse> {
    Json(auth.into())
}
