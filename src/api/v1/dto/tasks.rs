/*
 * Responsibility
 * - Tasks の request/response DTO
 * - 列挙値・日時の型チェックは serde の deserialize に任せる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::task_repo::{TaskFields, TaskPriority, TaskRow, TaskStatus};

/// Body of POST /tasks and PUT /tasks/{id}.
#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub priority: TaskPriority,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
}

fn default_status() -> TaskStatus {
    TaskStatus::Pending
}

impl TaskRequest {
    pub fn fields(&self) -> TaskFields<'_> {
        TaskFields {
            title: &self.title,
            priority: self.priority,
            description: &self.description,
            due_date: self.due_date,
            status: self.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub priority: TaskPriority,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRow> for TaskResponse {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            priority: row.priority,
            description: row.description,
            due_date: row.due_date,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_status_and_description() {
        let req: TaskRequest = serde_json::from_value(json!({
            "title": "write report",
            "priority": "medium",
            "due_date": "2026-11-01T09:00:00Z"
        }))
        .unwrap();

        assert_eq!(req.status, TaskStatus::Pending);
        assert_eq!(req.description, "");
        assert_eq!(req.fields().priority, TaskPriority::Medium);
    }

    #[test]
    fn request_rejects_unknown_status() {
        let result = serde_json::from_value::<TaskRequest>(json!({
            "title": "write report",
            "priority": "low",
            "due_date": "2026-11-01T09:00:00Z",
            "status": "done"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn response_uses_camel_case_timestamps() {
        let now = Utc::now();
        let res = TaskResponse::from(TaskRow {
            id: 7,
            title: "t".into(),
            priority: TaskPriority::High,
            description: String::new(),
            due_date: now,
            status: TaskStatus::InProgress,
            created_at: now,
            updated_at: now,
        });

        let value = serde_json::to_value(res).unwrap();
        assert_eq!(value["status"], "in-progress");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
