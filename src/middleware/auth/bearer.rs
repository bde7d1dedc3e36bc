//! Bearer token 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を BearerGate に渡す
//! - 失敗時は 401 (code = AuthError の種別)。理由はログにだけ残す
//! - 成功時は AuthCtx を request extensions に格納し、handler は extractor で受け取る

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// 保護対象の Router に認証を掛ける。
///
/// ```ignore
/// let protected = middleware::auth::bearer::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, bearer_middleware))
}

async fn bearer_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match state.auth.authenticate_headers(req.headers()).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                error = %err,
                method = %req.method(),
                path = %req.uri().path(),
                "bearer authentication rejected"
            );
            return Err(err.into());
        }
    };

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::from(claims));

    Ok(next.run(req).await)
}
