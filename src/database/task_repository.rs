use crate::database::error::DatabaseError;
use crate::database::new_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Work item attached to an order
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub order_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub order_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// List filter; `order_owner` restricts to tasks on orders owned by that user
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub order_id: Option<String>,
    pub assigned_to: Option<String>,
    pub order_owner: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, DatabaseError>;

    async fn insert(&self, task: &NewTask) -> Result<Task, DatabaseError>;

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

const TASK_COLUMNS: &str = "t.id, t.order_id, t.title, t.description, t.assigned_to, t.status, \
     t.priority, t.due_date, t.created_by, t.created_at, t.updated_at";

pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for TaskRepository {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, DatabaseError> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN orders o ON o.id = t.order_id \
             WHERE ($1::text IS NULL OR t.order_id = $1) \
               AND ($2::text IS NULL OR t.assigned_to = $2) \
               AND ($3::text IS NULL OR o.user_id = $3) \
               AND ($4::text IS NULL OR t.status = $4) \
             ORDER BY t.created_at DESC"
        ))
        .bind(&filter.order_id)
        .bind(&filter.assigned_to)
        .bind(&filter.order_owner)
        .bind(&filter.status)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task, DatabaseError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks AS t \
             (id, order_id, title, description, assigned_to, status, priority, due_date, \
              created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(new_id())
        .bind(&task.order_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.assigned_to)
        .bind(TaskStatus::Todo.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(&task.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, DatabaseError> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks AS t SET \
               title = COALESCE($2, t.title), \
               description = COALESCE($3, t.description), \
               assigned_to = COALESCE($4, t.assigned_to), \
               status = COALESCE($5, t.status), \
               priority = COALESCE($6, t.priority), \
               due_date = COALESCE($7, t.due_date), \
               updated_at = NOW() \
             WHERE t.id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.assigned_to)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.due_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
