//! Subtask records with binary completion and applicability.

use super::{Content, SubtaskId, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A unit of work inside a task.
///
/// Completion is binary: the timestamp is set to "now" or cleared, never
/// graded. Applicability controls whether the subtask participates in the
/// parent task's completion accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    id: SubtaskId,
    task_id: TaskId,
    content: Content,
    assignee: Option<UserId>,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    applicable: bool,
}

/// Parameter object for reconstructing a persisted subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubtaskData {
    /// Persisted subtask identifier.
    pub id: SubtaskId,
    /// Persisted parent task.
    pub task_id: TaskId,
    /// Persisted content text.
    pub content: Content,
    /// Persisted assignee, if any.
    pub assignee: Option<UserId>,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted applicability flag.
    pub applicable: bool,
}

impl Subtask {
    /// Creates a new incomplete, applicable subtask.
    #[must_use]
    pub fn new(task_id: TaskId, content: Content) -> Self {
        Self {
            id: SubtaskId::new(),
            task_id,
            content,
            assignee: None,
            due_date: None,
            completed_at: None,
            applicable: true,
        }
    }

    /// Reconstructs a subtask from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubtaskData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            content: data.content,
            assignee: data.assignee,
            due_date: data.due_date,
            completed_at: data.completed_at,
            applicable: data.applicable,
        }
    }

    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubtaskId {
        self.id
    }

    /// Returns the parent task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the content text.
    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the due date, if set.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the completion timestamp, if set.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Replaces the content text.
    pub fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Replaces the due date.
    pub const fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    /// Assigns the subtask to a user.
    ///
    /// Returns true when the assignee actually changed.
    pub fn assign_to(&mut self, user: UserId) -> bool {
        if self.assignee == Some(user) {
            return false;
        }
        self.assignee = Some(user);
        true
    }

    /// Removes the current assignee.
    ///
    /// Returns true when an assignee was removed.
    pub const fn unassign(&mut self) -> bool {
        if self.assignee.is_none() {
            return false;
        }
        self.assignee = None;
        true
    }

    /// Marks the subtask complete.
    ///
    /// Returns true when the flag flipped, false when already complete.
    pub fn mark_completed(&mut self, clock: &impl Clock) -> bool {
        if self.completed_at.is_some() {
            return false;
        }
        self.completed_at = Some(clock.utc());
        true
    }

    /// Clears the completion timestamp.
    ///
    /// Returns true when the flag flipped, false when already incomplete.
    pub const fn mark_incomplete(&mut self) -> bool {
        if self.completed_at.is_none() {
            return false;
        }
        self.completed_at = None;
        true
    }

    /// Sets the applicability flag.
    ///
    /// Never touches the completion timestamp: flipping applicability after
    /// completion does not retroactively alter `completed_at`.
    ///
    /// Returns true when the flag actually changed.
    pub const fn set_applicable(&mut self, applicable: bool) -> bool {
        if self.applicable == applicable {
            return false;
        }
        self.applicable = applicable;
        true
    }

    /// Returns true when the completion timestamp is set.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns true when the subtask participates in completion accounting.
    #[must_use]
    pub const fn is_applicable(&self) -> bool {
        self.applicable
    }
}
