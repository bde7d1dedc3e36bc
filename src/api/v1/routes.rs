/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /tasks, /me を束ね、Bearer 検証 middleware をまとめて適用する
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{
    me::me,
    tasks::{create_task, delete_task, get_task, list_tasks, replace_task},
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(replace_task).delete(delete_task),
        )
        .route("/me", get(me));

    middleware::auth::bearer::apply(protected, state)
}
