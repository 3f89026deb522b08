//! Task aggregate root and pure status derivation.

use super::{Approval, ColumnId, Content, ParsePriorityError, Stage, Subtask, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

/// Completion accounting over a task's applicable subtasks.
///
/// Counts replace the fractional ratio: the ratio equals `1.0` exactly when
/// `completed == applicable`, which holds vacuously for a task with no
/// applicable subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRatio {
    completed: usize,
    applicable: usize,
}

impl CompletionRatio {
    /// Computes the ratio over a task's subtasks.
    ///
    /// Subtasks flagged not applicable are excluded from both counts,
    /// whatever their completion timestamp says.
    #[must_use]
    pub fn of(subtasks: &[Subtask]) -> Self {
        let applicable = subtasks.iter().filter(|s| s.is_applicable()).count();
        let completed = subtasks
            .iter()
            .filter(|s| s.is_applicable() && s.is_completed())
            .count();
        Self {
            completed,
            applicable,
        }
    }

    /// Builds a ratio from raw counts.
    #[must_use]
    pub const fn from_counts(completed: usize, applicable: usize) -> Self {
        Self {
            completed,
            applicable,
        }
    }

    /// Returns the number of applicable completed subtasks.
    #[must_use]
    pub const fn completed(self) -> usize {
        self.completed
    }

    /// Returns the number of applicable subtasks.
    #[must_use]
    pub const fn applicable(self) -> usize {
        self.applicable
    }

    /// Returns true when every applicable subtask is complete.
    ///
    /// Vacuously true for a task with zero applicable subtasks: a task with
    /// no actionable work is ready to complete.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.completed == self.applicable
    }

    /// Returns true when no applicable subtask is complete.
    #[must_use]
    pub const fn none_complete(self) -> bool {
        self.completed == 0
    }
}

/// Task aggregate root.
///
/// The column reference is the sole authority for the task's pipeline
/// position; derived status never overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    column_id: ColumnId,
    content: Content,
    priority: Priority,
    assignee: Option<UserId>,
    due_date: Option<DateTime<Utc>>,
    start_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    approval: Approval,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning column.
    pub column_id: ColumnId,
    /// Persisted content text.
    pub content: Content,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted assignee, if any.
    pub assignee: Option<UserId>,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted start date, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted approval marker.
    pub approval: Approval,
}

impl Task {
    /// Creates a new task in the given column.
    #[must_use]
    pub fn new(column_id: ColumnId, content: Content) -> Self {
        Self {
            id: TaskId::new(),
            column_id,
            content,
            priority: Priority::default(),
            assignee: None,
            due_date: None,
            start_date: None,
            completed_at: None,
            approval: Approval::Pending,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            column_id: data.column_id,
            content: data.content,
            priority: data.priority,
            assignee: data.assignee,
            due_date: data.due_date,
            start_date: data.start_date,
            completed_at: data.completed_at,
            approval: data.approval,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning column identifier.
    #[must_use]
    pub const fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Returns the content text.
    #[must_use]
    pub const fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
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

    /// Returns the start date, if set.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the completion timestamp, if set.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the approval marker.
    #[must_use]
    pub const fn approval(&self) -> Approval {
        self.approval
    }

    /// Replaces the content text.
    pub fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Replaces the priority.
    pub const fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Replaces the due date.
    pub const fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    /// Replaces the start date.
    pub const fn set_start_date(&mut self, start_date: Option<DateTime<Utc>>) {
        self.start_date = start_date;
    }

    /// Moves the task to another column.
    pub const fn move_to_column(&mut self, column_id: ColumnId) {
        self.column_id = column_id;
    }

    /// Assigns the task to a user.
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

    /// Marks the task as completed and awaiting approval.
    pub fn mark_completed(&mut self, clock: &impl Clock) {
        self.completed_at = Some(clock.utc());
        self.approval = Approval::Pending;
    }

    /// Clears completion and approval after a reverted subtask.
    pub const fn mark_incomplete(&mut self) {
        self.completed_at = None;
        self.approval = Approval::Pending;
    }

    /// Marks the task as approved.
    pub const fn mark_approved(&mut self) {
        self.approval = Approval::Approved;
    }

    /// Marks the task as rejected, sending it back for rework.
    pub const fn mark_rejected(&mut self) {
        self.approval = Approval::Rejected;
    }

    /// Returns true when the task is approved, fully complete, and carries a
    /// completion timestamp.
    #[must_use]
    pub const fn is_completed(&self, ratio: CompletionRatio) -> bool {
        self.approval.is_approved() && ratio.is_full() && self.completed_at.is_some()
    }

    /// Returns true when the due date has passed and the task is not
    /// completed.
    #[must_use]
    pub fn is_overdue(&self, ratio: CompletionRatio, now: DateTime<Utc>) -> bool {
        self.due_date
            .is_some_and(|due_date| due_date < now && !self.is_completed(ratio))
    }

    /// Derives the lifecycle stage this task's state currently corresponds
    /// to, ignoring its stored column position.
    ///
    /// Evaluation order: completed, review, overdue, pending, in progress.
    #[must_use]
    pub fn derived_status(&self, ratio: CompletionRatio, now: DateTime<Utc>) -> Stage {
        if self.is_completed(ratio) {
            return Stage::Completed;
        }
        if self.completed_at.is_some() && ratio.is_full() && !self.approval.is_approved() {
            return Stage::Review;
        }
        if self.is_overdue(ratio, now) {
            return Stage::Delayed;
        }
        if ratio.none_complete() && self.completed_at.is_none() {
            return Stage::Pending;
        }
        Stage::InProgress
    }
}
