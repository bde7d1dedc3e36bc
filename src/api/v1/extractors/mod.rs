/*
 * Responsibility
 * - handler が受け取る extractor の公開ポイント
 */
pub mod auth_ctx;
pub mod task_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use task_id::TaskId;
