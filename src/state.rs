/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, auth: BearerGate
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::BearerGate;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<BearerGate>,
}

impl AppState {
    pub fn new(db: PgPool, auth: Arc<BearerGate>) -> Self {
        Self { db, auth }
    }
}
