/*
 * Responsibility
 * - /tasks 系 CRUD handler
 * - Bearer 検証は middleware 済み。handler は AuthCtx を参照してログに主体を残す
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

use crate::{
    api::v1::{
        dto::tasks::{TaskRequest, TaskResponse},
        extractors::{AuthCtxExtractor, TaskId},
    },
    error::AppError,
    repos::task_repo,
    state::AppState,
};

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let rows = task_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(TaskResponse::from).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    TaskId(id): TaskId,
) -> Result<Json<TaskResponse>, AppError> {
    let row = task_repo::get(&state.db, id)
        .await?
        .ok_or(AppError::not_found("task"))?;

    Ok(Json(row.into()))
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    let Json(req) = payload?;

    let row = task_repo::create(&state.db, req.fields()).await?;
    info!(task_id = row.id, sub = %auth.subject, "task created");

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn replace_task(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    TaskId(id): TaskId,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let Json(req) = payload?;

    let row = task_repo::replace(&state.db, id, req.fields())
        .await?
        .ok_or(AppError::not_found("task"))?;
    info!(task_id = id, sub = %auth.subject, "task replaced");

    Ok(Json(row.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    TaskId(id): TaskId,
) -> Result<StatusCode, AppError> {
    if !task_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("task"));
    }
    info!(task_id = id, sub = %auth.subject, "task deleted");

    Ok(StatusCode::NO_CONTENT)
}
