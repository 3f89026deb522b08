//! Immutable activity feed entries.

use super::{ActivityId, ProjectId, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One entry in a project's audit trail.
///
/// Immutable once recorded, except for its read marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    id: ActivityId,
    project_id: ProjectId,
    task_id: Option<TaskId>,
    user_id: UserId,
    comment: String,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedActivityData {
    /// Persisted activity identifier.
    pub id: ActivityId,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted task reference, if any.
    pub task_id: Option<TaskId>,
    /// Persisted acting user.
    pub user_id: UserId,
    /// Persisted comment text.
    pub comment: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted read timestamp, if any.
    pub read_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// Records a new unread activity entry.
    #[must_use]
    pub fn record(
        project_id: ProjectId,
        actor: UserId,
        task_id: Option<TaskId>,
        comment: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            project_id,
            task_id,
            user_id: actor,
            comment: comment.into(),
            created_at: clock.utc(),
            read_at: None,
        }
    }

    /// Reconstructs an activity entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedActivityData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            task_id: data.task_id,
            user_id: data.user_id,
            comment: data.comment,
            created_at: data.created_at,
            read_at: data.read_at,
        }
    }

    /// Returns the activity identifier.
    #[must_use]
    pub const fn id(&self) -> ActivityId {
        self.id
    }

    /// Returns the project reference.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the task reference, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the comment text.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true when the entry has been read.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Returns the read timestamp, if any.
    #[must_use]
    pub const fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    /// Marks the entry as read.
    pub fn mark_read(&mut self, clock: &impl Clock) {
        if self.read_at.is_none() {
            self.read_at = Some(clock.utc());
        }
    }
}
