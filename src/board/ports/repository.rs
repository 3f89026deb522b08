//! Repository port for board persistence and ordered lookup.

use crate::board::domain::{
    Activity, ActivityId, Column, ColumnId, Project, ProjectId, Subtask, SubtaskId, Task, TaskId,
    Watcher,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Board persistence contract.
///
/// Column reads are ordered by rank. The combined subtask-and-task write is
/// transactional so a completion toggle and the column move it causes are
/// applied atomically or not at all.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new project together with its canonical columns, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateProject`] when the project
    /// identifier already exists.
    async fn insert_project(
        &self,
        project: &Project,
        columns: &[Column],
    ) -> BoardRepositoryResult<()>;

    /// Persists changes to an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::ProjectNotFound`] when the project
    /// does not exist.
    async fn update_project(&self, project: &Project) -> BoardRepositoryResult<()>;

    /// Finds a project by identifier, archived projects included.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>>;

    /// Returns a project's columns ordered by ascending rank.
    async fn columns_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Column>>;

    /// Finds a column by identifier.
    ///
    /// Returns `None` when the column does not exist.
    async fn find_column(&self, id: ColumnId) -> BoardRepositoryResult<Option<Column>>;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateTask`] when the task
    /// identifier already exists.
    async fn insert_task(&self, task: &Task) -> BoardRepositoryResult<()>;

    /// Persists changes to an existing task (column moves, completion,
    /// approval, assignment).
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task(&self, task: &Task) -> BoardRepositoryResult<()>;

    /// Hard-deletes a task together with its subtasks.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::TaskNotFound`] when the task does not
    /// exist.
    async fn delete_task(&self, id: TaskId) -> BoardRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> BoardRepositoryResult<Option<Task>>;

    /// Stores a new subtask.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateSubtask`] when the subtask
    /// identifier already exists.
    async fn insert_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()>;

    /// Persists changes to an existing subtask.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::SubtaskNotFound`] when the subtask
    /// does not exist.
    async fn update_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()>;

    /// Persists a subtask toggle and the parent task's migration in one
    /// transaction: both writes succeed or neither does.
    ///
    /// # Errors
    ///
    /// Returns the mismatching `NotFound` variant when either record is
    /// missing; no partial mutation is applied.
    async fn update_subtask_and_task(
        &self,
        subtask: &Subtask,
        task: &Task,
    ) -> BoardRepositoryResult<()>;

    /// Hard-deletes a subtask.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::SubtaskNotFound`] when the subtask
    /// does not exist.
    async fn delete_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<()>;

    /// Finds a subtask by identifier.
    ///
    /// Returns `None` when the subtask does not exist.
    async fn find_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<Option<Subtask>>;

    /// Returns all subtasks of a task.
    async fn subtasks_of_task(&self, id: TaskId) -> BoardRepositoryResult<Vec<Subtask>>;

    /// Appends an immutable activity entry.
    async fn insert_activity(&self, activity: &Activity) -> BoardRepositoryResult<()>;

    /// Finds an activity entry by identifier.
    ///
    /// Returns `None` when the entry does not exist.
    async fn find_activity(&self, id: ActivityId) -> BoardRepositoryResult<Option<Activity>>;

    /// Persists the read marker of an existing entry. Entries are otherwise
    /// immutable.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::ActivityNotFound`] when the entry
    /// does not exist.
    async fn update_activity(&self, activity: &Activity) -> BoardRepositoryResult<()>;

    /// Returns a project's activity feed, newest first.
    async fn activities_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Activity>>;

    /// Registers a watcher subscription.
    ///
    /// Registering the same (project, user) pair twice is a no-op.
    async fn insert_watcher(&self, watcher: &Watcher) -> BoardRepositoryResult<()>;

    /// Returns all watchers of a project.
    async fn watchers_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Watcher>>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A subtask with the same identifier already exists.
    #[error("duplicate subtask identifier: {0}")]
    DuplicateSubtask(SubtaskId),

    /// The project was not found.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The column was not found.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The subtask was not found.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),

    /// The activity entry was not found.
    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
