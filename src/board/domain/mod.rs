//! Domain model for the kanban board.
//!
//! The board domain models projects with their five canonical columns, tasks
//! and subtasks with binary completion state, the immutable activity feed,
//! and watcher subscriptions, while keeping all infrastructure concerns
//! outside of the domain boundary. Status derivation is pure: predicates take
//! a snapshot plus the current time and never touch storage.

mod activity;
mod column;
mod error;
mod ids;
mod project;
mod subtask;
mod task;
mod watcher;

pub use activity::{Activity, PersistedActivityData};
pub use column::{BoardLayout, Column, Stage};
pub use error::{
    BoardDomainError, ParseApprovalError, ParsePriorityError, ParseStageError,
    ParseVisibilityError,
};
pub use ids::{ActivityId, ColumnId, Content, EmailAddress, ProjectId, SubtaskId, TaskId, UserId};
pub use project::{Approval, PersistedProjectData, Project, Visibility};
pub use subtask::{PersistedSubtaskData, Subtask};
pub use task::{CompletionRatio, PersistedTaskData, Priority, Task};
pub use watcher::Watcher;
