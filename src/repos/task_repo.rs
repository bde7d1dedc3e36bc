/*
 * Responsibility
 * - tasks テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD を提供
 * - DB エラーは RepoError に変換して返す
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub priority: TaskPriority,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Column values written by create / replace.
#[derive(Debug, Clone)]
pub struct TaskFields<'a> {
    pub title: &'a str,
    pub priority: TaskPriority,
    pub description: &'a str,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
}

pub async fn list(db: &PgPool) -> Result<Vec<TaskRow>, RepoError> {
    let rows = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, title, priority, description, due_date, status, "createdAt", "updatedAt"
        FROM tasks
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get(db: &PgPool, id: i64) -> Result<Option<TaskRow>, RepoError> {
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, title, priority, description, due_date, status, "createdAt", "updatedAt"
        FROM tasks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn create(db: &PgPool, fields: TaskFields<'_>) -> Result<TaskRow, RepoError> {
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        INSERT INTO tasks (title, priority, description, due_date, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, priority, description, due_date, status, "createdAt", "updatedAt"
        "#,
    )
    .bind(fields.title)
    .bind(fields.priority)
    .bind(fields.description)
    .bind(fields.due_date)
    .bind(fields.status)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Full replacement (PUT). Returns None when the task does not exist.
pub async fn replace(
    db: &PgPool,
    id: i64,
    fields: TaskFields<'_>,
) -> Result<Option<TaskRow>, RepoError> {
    let row = sqlx::query_as::<_, TaskRow>(
        r#"
        UPDATE tasks
        SET
            title = $2,
            priority = $3,
            description = $4,
            due_date = $5,
            status = $6,
            "updatedAt" = now()
        WHERE id = $1
        RETURNING id, title, priority, description, due_date, status, "createdAt", "updatedAt"
        "#,
    )
    .bind(id)
    .bind(fields.title)
    .bind(fields.priority)
    .bind(fields.description)
    .bind(fields.due_date)
    .bind(fields.status)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM tasks
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
