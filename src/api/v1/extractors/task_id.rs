/*
 * Responsibility
 * - Path の {task_id} を i64 として受け取る
 * - 数値でなければ AppError::bad_request (JSON エラーボディ) に変換
 */
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct TaskId(pub i64);

impl FromRequestParts<AppState> for TaskId {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::bad_request("INVALID_ID", e.body_text()))?;
        Ok(Self(id))
    }
}
