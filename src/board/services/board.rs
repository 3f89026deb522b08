//! Board orchestration behind the authorization gate.
//!
//! [`BoardService`] is the single entry point for user-driven mutations. Every
//! operation authorizes the actor, applies the change, records an activity
//! entry, and fans the entry out to project watchers. Column moves are
//! delegated to the [`MigrationEngine`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;

use crate::board::{
    domain::{
        Activity, ActivityId, BoardDomainError, BoardLayout, Column, ColumnId, Content,
        EmailAddress, Priority, Project, ProjectId, Stage, Subtask, SubtaskId, Task, TaskId,
        UserId, Visibility, Watcher,
    },
    ports::{
        Authorizer, AuthorizerError, BoardAction, BoardRepository, BoardRepositoryError,
        MailGateway,
    },
    services::{
        ActivityRecorder, DispatchReport, MigrationEngine, MigrationError, NotificationDispatcher,
        SubtaskEvent, TaskTransition,
    },
};

/// Result type for board service operations.
pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// A state transition the aggregate does not permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The project is archived; archived projects reject all mutation.
    #[error("project {0} is archived")]
    ProjectArchived(ProjectId),

    /// The task is not in review, so it cannot be approved or rejected.
    #[error("task {0} is not awaiting approval")]
    NotAwaitingApproval(TaskId),
}

/// Errors returned by [`BoardService`].
#[derive(Debug, Error)]
pub enum BoardServiceError {
    /// The actor is not permitted to perform the action on the project.
    #[error("user {actor} is not permitted to {action:?} on project {project}")]
    Unauthorized {
        /// The denied user.
        actor: UserId,
        /// The project the action targeted.
        project: ProjectId,
        /// The denied action.
        action: BoardAction,
    },

    /// The project could not be resolved.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The column could not be resolved.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The task could not be resolved.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The subtask could not be resolved.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),

    /// The activity entry could not be resolved.
    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    /// The requested state transition is not permitted.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// The authorizer could not answer.
    #[error(transparent)]
    Authorizer(#[from] AuthorizerError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
}

impl From<MigrationError> for BoardServiceError {
    fn from(source: MigrationError) -> Self {
        match source {
            MigrationError::TaskNotFound(id) => Self::TaskNotFound(id),
            MigrationError::SubtaskNotFound(id) => Self::SubtaskNotFound(id),
            MigrationError::ColumnNotFound(id) => Self::ColumnNotFound(id),
            MigrationError::Domain(inner) => Self::Domain(inner),
            MigrationError::Repository(inner) => Self::Repository(inner),
        }
    }
}

/// A mutation result together with its audit trail.
#[derive(Debug, Clone)]
pub struct Mutated<T> {
    /// The mutated value.
    pub value: T,
    /// The recorded activity entry.
    pub activity: Activity,
    /// The watcher fan-out report for the entry.
    pub dispatch: DispatchReport,
}

/// Result of a subtask completion toggle.
///
/// A redundant toggle carries no transition, no activity, and an empty
/// dispatch report.
#[derive(Debug, Clone)]
pub struct SubtaskToggle {
    /// The subtask after the toggle.
    pub subtask: Subtask,
    /// The parent task after any migration.
    pub task: Task,
    /// The column move the toggle caused, if any.
    pub transition: Option<TaskTransition>,
    /// The recorded activity entry, when the flag actually flipped.
    pub activity: Option<Activity>,
    /// The watcher fan-out report.
    pub dispatch: DispatchReport,
}

/// Input for creating a project with its canonical board.
#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    name: String,
    visibility: Visibility,
    owner_email: EmailAddress,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl CreateProjectRequest {
    /// Creates a request; the creator is enrolled as the first watcher at
    /// `owner_email`.
    #[must_use]
    pub fn new(name: impl Into<String>, visibility: Visibility, owner_email: EmailAddress) -> Self {
        Self {
            name: name.into(),
            visibility,
            owner_email,
            start_date: None,
            end_date: None,
        }
    }

    /// Sets the project timeline.
    #[must_use]
    pub const fn with_timeline(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

/// Input for creating a task in a column.
#[derive(Debug, Clone)]
pub struct CreateTaskRequest {
    column: ColumnId,
    content: String,
    priority: Option<Priority>,
    assignee: Option<UserId>,
    due_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Creates a request for a task in `column`.
    #[must_use]
    pub fn new(column: ColumnId, content: impl Into<String>) -> Self {
        Self {
            column,
            content: content.into(),
            priority: None,
            assignee: None,
            due_date: None,
        }
    }

    /// Sets the task priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the initial assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Input for editing a task. Content and due date are replaced wholesale; a
/// request without a due date clears it.
#[derive(Debug, Clone)]
pub struct UpdateTaskRequest {
    task: TaskId,
    content: String,
    priority: Option<Priority>,
    due_date: Option<DateTime<Utc>>,
}

impl UpdateTaskRequest {
    /// Creates a request replacing the task's content.
    #[must_use]
    pub fn new(task: TaskId, content: impl Into<String>) -> Self {
        Self {
            task,
            content: content.into(),
            priority: None,
            due_date: None,
        }
    }

    /// Replaces the task priority; omitted, the priority is kept.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due date; omitted, the due date is cleared.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Input for creating a subtask under a task.
#[derive(Debug, Clone)]
pub struct CreateSubtaskRequest {
    task: TaskId,
    content: String,
    assignee: Option<UserId>,
    due_date: Option<DateTime<Utc>>,
}

impl CreateSubtaskRequest {
    /// Creates a request for a subtask under `task`.
    #[must_use]
    pub fn new(task: TaskId, content: impl Into<String>) -> Self {
        Self {
            task,
            content: content.into(),
            assignee: None,
            due_date: None,
        }
    }

    /// Sets the initial assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Input for editing a subtask. Content and due date are replaced wholesale;
/// a request without a due date clears it.
#[derive(Debug, Clone)]
pub struct UpdateSubtaskRequest {
    subtask: SubtaskId,
    content: String,
    due_date: Option<DateTime<Utc>>,
}

impl UpdateSubtaskRequest {
    /// Creates a request replacing the subtask's content.
    #[must_use]
    pub fn new(subtask: SubtaskId, content: impl Into<String>) -> Self {
        Self {
            subtask,
            content: content.into(),
            due_date: None,
        }
    }

    /// Sets the due date; omitted, the due date is cleared.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Orchestrates board mutations: authorization, the change itself, the
/// activity record, and the watcher fan-out, in that order.
///
/// The activity entry is recorded only after the change persisted, so the
/// feed never mentions a mutation that did not happen.
pub struct BoardService<R, A, M, C>
where
    R: BoardRepository,
    A: Authorizer,
    M: MailGateway,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    authorizer: Arc<A>,
    clock: Arc<C>,
    engine: MigrationEngine<R, C>,
    recorder: ActivityRecorder<R, C>,
    dispatcher: NotificationDispatcher<R, M>,
}

impl<R, A, M, C> BoardService<R, A, M, C>
where
    R: BoardRepository,
    A: Authorizer,
    M: MailGateway,
    C: Clock + Send + Sync,
{
    /// Creates a service over the given ports.
    #[must_use]
    pub fn new(repository: Arc<R>, authorizer: Arc<A>, mail: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            engine: MigrationEngine::new(Arc::clone(&repository), Arc::clone(&clock)),
            recorder: ActivityRecorder::new(Arc::clone(&repository), Arc::clone(&clock)),
            dispatcher: NotificationDispatcher::new(Arc::clone(&repository), mail),
            repository,
            authorizer,
            clock,
        }
    }

    async fn authorize(
        &self,
        actor: UserId,
        project: ProjectId,
        action: BoardAction,
    ) -> BoardServiceResult<()> {
        if self.authorizer.can_mutate(actor, project, action).await? {
            Ok(())
        } else {
            Err(BoardServiceError::Unauthorized {
                actor,
                project,
                action,
            })
        }
    }

    fn ensure_active(project: &Project) -> BoardServiceResult<()> {
        if project.is_archived() {
            return Err(TransitionError::ProjectArchived(project.id()).into());
        }
        Ok(())
    }

    async fn require_project(&self, id: ProjectId) -> BoardServiceResult<Project> {
        self.repository
            .find_project(id)
            .await?
            .ok_or(BoardServiceError::ProjectNotFound(id))
    }

    async fn require_column(&self, id: ColumnId) -> BoardServiceResult<Column> {
        self.repository
            .find_column(id)
            .await?
            .ok_or(BoardServiceError::ColumnNotFound(id))
    }

    async fn require_task(&self, id: TaskId) -> BoardServiceResult<Task> {
        self.repository
            .find_task(id)
            .await?
            .ok_or(BoardServiceError::TaskNotFound(id))
    }

    async fn require_subtask(&self, id: SubtaskId) -> BoardServiceResult<Subtask> {
        self.repository
            .find_subtask(id)
            .await?
            .ok_or(BoardServiceError::SubtaskNotFound(id))
    }

    async fn project_of_task(&self, task: &Task) -> BoardServiceResult<Project> {
        let column = self.require_column(task.column_id()).await?;
        self.require_project(column.project_id()).await
    }

    async fn record_and_notify(
        &self,
        project: ProjectId,
        actor: UserId,
        task: Option<TaskId>,
        comment: String,
    ) -> BoardServiceResult<(Activity, DispatchReport)> {
        let activity = self.recorder.record(project, actor, task, comment).await?;
        let dispatch = self.dispatcher.notify(project, &activity).await?;
        Ok((activity, dispatch))
    }

    /// Creates a project with its canonical five-column board and enrolls the
    /// creator as its first watcher.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the name is invalid, the actor is
    /// not permitted, or persistence fails.
    pub async fn create_project(
        &self,
        actor: UserId,
        request: CreateProjectRequest,
    ) -> BoardServiceResult<Mutated<Project>> {
        let name = Content::new(request.name)?;
        let mut project = Project::new(name, request.visibility);
        project.set_timeline(request.start_date, request.end_date);
        self.authorize(actor, project.id(), BoardAction::ManageProject)
            .await?;

        let columns = Column::canonical_board(project.id());
        self.repository.insert_project(&project, &columns).await?;
        self.repository
            .insert_watcher(&Watcher::new(project.id(), actor, request.owner_email))
            .await?;

        let comment = format!("created project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Archives a project. Archived projects reject all further mutation but
    /// remain readable.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or already
    /// archived, the actor is not permitted, or persistence fails.
    pub async fn archive_project(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> BoardServiceResult<Mutated<Project>> {
        let mut project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        project.archive(&*self.clock);
        self.repository.update_project(&project).await?;

        let comment = format!("archived project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Marks a project completed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or archived,
    /// the actor is not permitted, or persistence fails.
    pub async fn complete_project(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> BoardServiceResult<Mutated<Project>> {
        let mut project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        project.mark_completed(&*self.clock);
        self.repository.update_project(&project).await?;

        let comment = format!("completed project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Reopens a completed project, clearing its completion timestamp and
    /// resetting its approval to pending.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or archived,
    /// the actor is not permitted, or persistence fails.
    pub async fn reopen_project(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> BoardServiceResult<Mutated<Project>> {
        let mut project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        project.reopen();
        self.repository.update_project(&project).await?;

        let comment = format!("reopened project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Approves a project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or archived,
    /// the actor is not permitted, or persistence fails.
    pub async fn approve_project(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> BoardServiceResult<Mutated<Project>> {
        let mut project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        project.approve();
        self.repository.update_project(&project).await?;

        let comment = format!("approved project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Rejects a project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or archived,
    /// the actor is not permitted, or persistence fails.
    pub async fn reject_project(
        &self,
        actor: UserId,
        project_id: ProjectId,
    ) -> BoardServiceResult<Mutated<Project>> {
        let mut project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        project.reject();
        self.repository.update_project(&project).await?;

        let comment = format!("rejected project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: project,
            activity,
            dispatch,
        })
    }

    /// Enrolls a user as a watcher of the project. Enrolling an existing
    /// watcher again is a no-op in the store but still recorded.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the project is missing or archived,
    /// the actor is not permitted, or persistence fails.
    pub async fn add_watcher(
        &self,
        actor: UserId,
        project_id: ProjectId,
        user: UserId,
        email: EmailAddress,
    ) -> BoardServiceResult<Mutated<Watcher>> {
        let project = self.require_project(project_id).await?;
        self.authorize(actor, project_id, BoardAction::ManageProject)
            .await?;
        Self::ensure_active(&project)?;

        let watcher = Watcher::new(project_id, user, email);
        self.repository.insert_watcher(&watcher).await?;

        let comment = format!("added a watcher to project - {}", project.name());
        let (activity, dispatch) = self
            .record_and_notify(project_id, actor, None, comment)
            .await?;
        Ok(Mutated {
            value: watcher,
            activity,
            dispatch,
        })
    }

    /// Creates a task in the requested column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the column or its project is
    /// missing, the project is archived, the content is invalid, the actor is
    /// not permitted, or persistence fails.
    pub async fn create_task(
        &self,
        actor: UserId,
        request: CreateTaskRequest,
    ) -> BoardServiceResult<Mutated<Task>> {
        let column = self.require_column(request.column).await?;
        let project = self.require_project(column.project_id()).await?;
        self.authorize(actor, project.id(), BoardAction::CreateTask)
            .await?;
        Self::ensure_active(&project)?;

        let content = Content::new(request.content)?;
        let mut task = Task::new(column.id(), content);
        if let Some(priority) = request.priority {
            task.set_priority(priority);
        }
        if let Some(assignee) = request.assignee {
            task.assign_to(assignee);
        }
        task.set_due_date(request.due_date);
        self.repository.insert_task(&task).await?;

        let comment = format!("created a new task - {}", task.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Replaces a task's content, priority, and due date.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the content is invalid, the actor is not
    /// permitted, or persistence fails.
    pub async fn update_task(
        &self,
        actor: UserId,
        request: UpdateTaskRequest,
    ) -> BoardServiceResult<Mutated<Task>> {
        let mut task = self.require_task(request.task).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditTask)
            .await?;
        Self::ensure_active(&project)?;

        task.set_content(Content::new(request.content)?);
        task.set_due_date(request.due_date);
        if let Some(priority) = request.priority {
            task.set_priority(priority);
        }
        self.repository.update_task(&task).await?;

        let comment = format!("updated task - {}", task.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Assigns the task to `assignee`, or unassigns it for `None`.
    ///
    /// Returns `None` when the assignment already held; nothing is persisted
    /// or recorded in that case.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the actor is not permitted, or persistence
    /// fails.
    pub async fn assign_task(
        &self,
        actor: UserId,
        task_id: TaskId,
        assignee: Option<UserId>,
    ) -> BoardServiceResult<Option<Mutated<Task>>> {
        let mut task = self.require_task(task_id).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditTask)
            .await?;
        Self::ensure_active(&project)?;

        let changed = match assignee {
            Some(user) => task.assign_to(user),
            None => task.unassign(),
        };
        if !changed {
            return Ok(None);
        }
        self.repository.update_task(&task).await?;

        let comment = if assignee.is_some() {
            format!("assigned task - {}", task.content())
        } else {
            format!("unassigned task - {}", task.content())
        };
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Some(Mutated {
            value: task,
            activity,
            dispatch,
        }))
    }

    /// Approves a task awaiting review and moves it to the completed column.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAwaitingApproval`] when the task is not
    /// in the review column, and [`BoardServiceError`] when the task or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn approve_task(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> BoardServiceResult<Mutated<Task>> {
        let (mut task, project, layout, current) = self.task_in_layout(task_id).await?;
        self.authorize(actor, project.id(), BoardAction::ApproveTask)
            .await?;
        Self::ensure_active(&project)?;
        if current != Stage::Review {
            return Err(TransitionError::NotAwaitingApproval(task_id).into());
        }

        task.mark_approved();
        task.move_to_column(layout.column_for(Stage::Completed));
        self.repository.update_task(&task).await?;

        let comment = format!("approved task - {}", task.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Rejects a task awaiting review. The task stays in the review column
    /// with its approval marked rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAwaitingApproval`] when the task is not
    /// in the review column, and [`BoardServiceError`] when the task or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn reject_task(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> BoardServiceResult<Mutated<Task>> {
        let (mut task, project, _layout, current) = self.task_in_layout(task_id).await?;
        self.authorize(actor, project.id(), BoardAction::ApproveTask)
            .await?;
        Self::ensure_active(&project)?;
        if current != Stage::Review {
            return Err(TransitionError::NotAwaitingApproval(task_id).into());
        }

        task.mark_rejected();
        self.repository.update_task(&task).await?;

        let comment = format!("rejected task - {}", task.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Posts a comment on a task. The comment lands in the activity feed and
    /// is mailed to the project's watchers like any other mutation.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the text is invalid, the actor is not
    /// permitted, or persistence fails.
    pub async fn comment_task(
        &self,
        actor: UserId,
        task_id: TaskId,
        text: String,
    ) -> BoardServiceResult<Mutated<Task>> {
        let task = self.require_task(task_id).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::CommentTask)
            .await?;
        Self::ensure_active(&project)?;

        let text = Content::new(text)?;
        let comment = format!("commented on task - {text}");
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Deletes a task together with its subtasks and returns the last
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the actor is not permitted, or persistence
    /// fails.
    pub async fn delete_task(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> BoardServiceResult<Mutated<Task>> {
        let task = self.require_task(task_id).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::DeleteTask)
            .await?;
        Self::ensure_active(&project)?;

        self.repository.delete_task(task_id).await?;

        // The entry must not reference the deleted task.
        let comment = format!("deleted task - {}", task.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, None, comment)
            .await?;
        Ok(Mutated {
            value: task,
            activity,
            dispatch,
        })
    }

    /// Creates a subtask under a task. New subtasks are incomplete and
    /// applicable.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the content is invalid, the actor is not
    /// permitted, or persistence fails.
    pub async fn create_subtask(
        &self,
        actor: UserId,
        request: CreateSubtaskRequest,
    ) -> BoardServiceResult<Mutated<Subtask>> {
        let task = self.require_task(request.task).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditSubtask)
            .await?;
        Self::ensure_active(&project)?;

        let content = Content::new(request.content)?;
        let mut subtask = Subtask::new(task.id(), content);
        if let Some(assignee) = request.assignee {
            subtask.assign_to(assignee);
        }
        subtask.set_due_date(request.due_date);
        self.repository.insert_subtask(&subtask).await?;

        let comment = format!("a subtask has been created - {}", subtask.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: subtask,
            activity,
            dispatch,
        })
    }

    /// Replaces a subtask's content and due date.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the subtask, its task, or its
    /// project is missing, the project is archived, the content is invalid,
    /// the actor is not permitted, or persistence fails.
    pub async fn update_subtask(
        &self,
        actor: UserId,
        request: UpdateSubtaskRequest,
    ) -> BoardServiceResult<Mutated<Subtask>> {
        let mut subtask = self.require_subtask(request.subtask).await?;
        let task = self.require_task(subtask.task_id()).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditSubtask)
            .await?;
        Self::ensure_active(&project)?;

        subtask.set_content(Content::new(request.content)?);
        subtask.set_due_date(request.due_date);
        self.repository.update_subtask(&subtask).await?;

        let comment = format!("updated subtask - {}", subtask.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: subtask,
            activity,
            dispatch,
        })
    }

    /// Assigns the subtask to `assignee`, or unassigns it for `None`.
    ///
    /// Returns `None` when the assignment already held; nothing is persisted
    /// or recorded in that case.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the subtask, its task, or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn assign_subtask(
        &self,
        actor: UserId,
        subtask_id: SubtaskId,
        assignee: Option<UserId>,
    ) -> BoardServiceResult<Option<Mutated<Subtask>>> {
        let mut subtask = self.require_subtask(subtask_id).await?;
        let task = self.require_task(subtask.task_id()).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditSubtask)
            .await?;
        Self::ensure_active(&project)?;

        let changed = match assignee {
            Some(user) => subtask.assign_to(user),
            None => subtask.unassign(),
        };
        if !changed {
            return Ok(None);
        }
        self.repository.update_subtask(&subtask).await?;

        let comment = if assignee.is_some() {
            format!("assigned subtask - {}", subtask.content())
        } else {
            format!("unassigned subtask - {}", subtask.content())
        };
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Some(Mutated {
            value: subtask,
            activity,
            dispatch,
        }))
    }

    /// Marks a subtask applicable or not applicable.
    ///
    /// Applicability changes never touch the completion flag and never drive
    /// a column move on their own; call [`BoardService::reevaluate_task`] to
    /// fold the change into the parent's stage. Returns `None` when the flag
    /// already held.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the subtask, its task, or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn set_subtask_applicability(
        &self,
        actor: UserId,
        subtask_id: SubtaskId,
        applicable: bool,
    ) -> BoardServiceResult<Option<Mutated<Subtask>>> {
        let mut subtask = self.require_subtask(subtask_id).await?;
        let task = self.require_task(subtask.task_id()).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditSubtask)
            .await?;
        Self::ensure_active(&project)?;

        if !subtask.set_applicable(applicable) {
            return Ok(None);
        }
        self.repository.update_subtask(&subtask).await?;

        let comment = if applicable {
            format!("marked subtask as applicable - {}", subtask.content())
        } else {
            format!("marked subtask as not applicable - {}", subtask.content())
        };
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Some(Mutated {
            value: subtask,
            activity,
            dispatch,
        }))
    }

    /// Toggles a subtask's completion flag and migrates the parent task.
    ///
    /// The toggle and any column move are applied atomically by the
    /// migration engine. A redundant toggle returns with `transition` and
    /// `activity` unset and persists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the subtask, its task, or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn set_subtask_completion(
        &self,
        actor: UserId,
        subtask_id: SubtaskId,
        completed: bool,
    ) -> BoardServiceResult<SubtaskToggle> {
        let subtask = self.require_subtask(subtask_id).await?;
        let task = self.require_task(subtask.task_id()).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::CompleteSubtask)
            .await?;
        Self::ensure_active(&project)?;

        let event = if completed {
            SubtaskEvent::Completed
        } else {
            SubtaskEvent::Reverted
        };
        let outcome = self.engine.apply(subtask_id, event).await?;
        if !outcome.changed {
            return Ok(SubtaskToggle {
                subtask: outcome.subtask,
                task: outcome.task,
                transition: None,
                activity: None,
                dispatch: DispatchReport::default(),
            });
        }

        let comment = if completed {
            format!("completed subtask - {}", outcome.subtask.content())
        } else {
            format!("reopened subtask - {}", outcome.subtask.content())
        };
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(outcome.task.id()), comment)
            .await?;
        Ok(SubtaskToggle {
            subtask: outcome.subtask,
            task: outcome.task,
            transition: outcome.transition,
            activity: Some(activity),
            dispatch,
        })
    }

    /// Deletes a subtask and returns the last snapshot.
    ///
    /// Deletion alone never moves the parent; call
    /// [`BoardService::reevaluate_task`] afterwards when the removed subtask
    /// was the last incomplete one.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the subtask, its task, or its
    /// project is missing, the project is archived, the actor is not
    /// permitted, or persistence fails.
    pub async fn delete_subtask(
        &self,
        actor: UserId,
        subtask_id: SubtaskId,
    ) -> BoardServiceResult<Mutated<Subtask>> {
        let subtask = self.require_subtask(subtask_id).await?;
        let task = self.require_task(subtask.task_id()).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::DeleteTask)
            .await?;
        Self::ensure_active(&project)?;

        self.repository.delete_subtask(subtask_id).await?;

        let comment = format!("deleted subtask - {}", subtask.content());
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task.id()), comment)
            .await?;
        Ok(Mutated {
            value: subtask,
            activity,
            dispatch,
        })
    }

    /// Re-derives a task's stage with no subtask event, advancing a task
    /// whose applicable subtasks are already all complete. Returns `None`
    /// when the task is stable.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError`] when the task or its project is missing,
    /// the project is archived, the actor is not permitted, or persistence
    /// fails.
    pub async fn reevaluate_task(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> BoardServiceResult<Option<Mutated<TaskTransition>>> {
        let task = self.require_task(task_id).await?;
        let project = self.project_of_task(&task).await?;
        self.authorize(actor, project.id(), BoardAction::EditTask)
            .await?;
        Self::ensure_active(&project)?;

        let Some(transition) = self.engine.reevaluate(task_id).await? else {
            return Ok(None);
        };

        let comment = format!(
            "task moved to {} - {}",
            transition.to.column_name(),
            task.content()
        );
        let (activity, dispatch) = self
            .record_and_notify(project.id(), actor, Some(task_id), comment)
            .await?;
        Ok(Some(Mutated {
            value: transition,
            activity,
            dispatch,
        }))
    }

    /// Marks an activity entry read. Read markers are personal bookkeeping,
    /// so no new entry is recorded and watchers are not notified.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ActivityNotFound`] when the entry does
    /// not exist, or the repository error when persistence fails.
    pub async fn mark_activity_read(
        &self,
        activity_id: ActivityId,
    ) -> BoardServiceResult<Activity> {
        let mut activity = self
            .repository
            .find_activity(activity_id)
            .await?
            .ok_or(BoardServiceError::ActivityNotFound(activity_id))?;
        if !activity.is_read() {
            activity.mark_read(&*self.clock);
            self.repository.update_activity(&activity).await?;
        }
        Ok(activity)
    }

    /// Returns the project's activity feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ProjectNotFound`] when the project does
    /// not exist, or the repository error when the feed cannot be loaded.
    pub async fn activity_feed(&self, project_id: ProjectId) -> BoardServiceResult<Vec<Activity>> {
        self.require_project(project_id).await?;
        Ok(self.repository.activities_of_project(project_id).await?)
    }

    async fn task_in_layout(
        &self,
        task_id: TaskId,
    ) -> BoardServiceResult<(Task, Project, BoardLayout, Stage)> {
        let task = self.require_task(task_id).await?;
        let column = self.require_column(task.column_id()).await?;
        let project = self.require_project(column.project_id()).await?;
        let columns = self.repository.columns_of_project(project.id()).await?;
        let layout = BoardLayout::from_columns(&columns)?;
        let current = layout
            .stage_for(task.column_id())
            .ok_or(BoardServiceError::ColumnNotFound(task.column_id()))?;
        Ok((task, project, layout, current))
    }
}
