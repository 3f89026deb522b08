//! Diesel row models for board persistence.

use super::schema::{activities, columns, projects, subtasks, tasks, watchers};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for project records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = projects)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project name.
    pub name: String,
    /// Visibility scope.
    pub visibility: String,
    /// Optional timeline start.
    pub start_date: Option<DateTime<Utc>>,
    /// Optional timeline end.
    pub end_date: Option<DateTime<Utc>>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Archival timestamp, if archived.
    pub archived_at: Option<DateTime<Utc>>,
    /// Approval marker.
    pub approval: String,
}

/// Row model for board columns.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ColumnRow {
    /// Column identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Zero-based position on the board.
    pub rank: i32,
}

/// Row model for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning column.
    pub column_id: uuid::Uuid,
    /// Content text.
    pub content: String,
    /// Priority level.
    pub priority: String,
    /// Optional assignee.
    pub assignee: Option<uuid::Uuid>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional start date.
    pub start_date: Option<DateTime<Utc>>,
    /// Completion timestamp, if complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Approval marker.
    pub approval: String,
}

/// Row model for subtask records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = subtasks)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubtaskRow {
    /// Subtask identifier.
    pub id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Content text.
    pub content: String,
    /// Optional assignee.
    pub assignee: Option<uuid::Uuid>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Completion timestamp, if complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the subtask counts towards the completion ratio.
    pub applicable: bool,
}

/// Row model for activity entries.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = activities)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityRow {
    /// Activity identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Related task, if the entry concerns one.
    pub task_id: Option<uuid::Uuid>,
    /// Acting user.
    pub user_id: uuid::Uuid,
    /// Human-readable comment.
    pub comment: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Read timestamp, unset while unread.
    pub read_at: Option<DateTime<Utc>>,
}

/// Row model for watcher enrolment.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = watchers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WatcherRow {
    /// Watched project.
    pub project_id: uuid::Uuid,
    /// Watching user.
    pub user_id: uuid::Uuid,
    /// Delivery address.
    pub email: String,
}
