//! `PostgreSQL` repository implementation for board persistence.

use super::{
    models::{ActivityRow, ColumnRow, ProjectRow, SubtaskRow, TaskRow, WatcherRow},
    schema::{activities, columns, projects, subtasks, tasks, watchers},
};
use crate::board::{
    domain::{
        Activity, ActivityId, Approval, Column, ColumnId, Content, EmailAddress,
        PersistedActivityData, PersistedProjectData, PersistedSubtaskData, PersistedTaskData,
        Priority, Project, ProjectId, Subtask, SubtaskId, Task, TaskId, UserId, Visibility,
        Watcher,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

// Lets repository errors flow out of diesel transactions unchanged.
impl From<DieselError> for BoardRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed board repository.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BoardRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BoardRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BoardRepositoryError::persistence)?
    }
}

#[async_trait]
impl BoardRepository for PostgresBoardRepository {
    async fn insert_project(
        &self,
        project: &Project,
        board_columns: &[Column],
    ) -> BoardRepositoryResult<()> {
        let project_id = project.id();
        let project_row = to_project_row(project);
        let column_rows: Vec<ColumnRow> = board_columns.iter().map(to_column_row).collect();

        self.run_blocking(move |connection| {
            connection
                .transaction(|txn| {
                    diesel::insert_into(projects::table)
                        .values(&project_row)
                        .execute(txn)?;
                    diesel::insert_into(columns::table)
                        .values(&column_rows)
                        .execute(txn)?;
                    Ok(())
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateProject(project_id)
                    }
                    other => BoardRepositoryError::persistence(other),
                })
        })
        .await
    }

    async fn update_project(&self, project: &Project) -> BoardRepositoryResult<()> {
        let project_id = project.id();
        let row = to_project_row(project);

        self.run_blocking(move |connection| {
            let updated = diesel::update(projects::table.find(project_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if updated == 0 {
                return Err(BoardRepositoryError::ProjectNotFound(project_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .find(id.into_inner())
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(row_to_project).transpose()
        })
        .await
    }

    async fn columns_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Column>> {
        self.run_blocking(move |connection| {
            let rows = columns::table
                .filter(columns::project_id.eq(id.into_inner()))
                .order(columns::rank.asc())
                .select(ColumnRow::as_select())
                .load::<ColumnRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_column).collect())
        })
        .await
    }

    async fn find_column(&self, id: ColumnId) -> BoardRepositoryResult<Option<Column>> {
        self.run_blocking(move |connection| {
            let row = columns::table
                .find(id.into_inner())
                .select(ColumnRow::as_select())
                .first::<ColumnRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            Ok(row.map(row_to_column))
        })
        .await
    }

    async fn insert_task(&self, task: &Task) -> BoardRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateTask(task_id)
                    }
                    other => BoardRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> BoardRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task);

        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if updated == 0 {
                return Err(BoardRepositoryError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> BoardRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction(|txn| {
                diesel::delete(subtasks::table.filter(subtasks::task_id.eq(id.into_inner())))
                    .execute(txn)?;
                let deleted = diesel::delete(tasks::table.find(id.into_inner())).execute(txn)?;
                if deleted == 0 {
                    return Err(BoardRepositoryError::TaskNotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> BoardRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn insert_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()> {
        let subtask_id = subtask.id();
        let row = to_subtask_row(subtask);

        self.run_blocking(move |connection| {
            diesel::insert_into(subtasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateSubtask(subtask_id)
                    }
                    other => BoardRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()> {
        let subtask_id = subtask.id();
        let row = to_subtask_row(subtask);

        self.run_blocking(move |connection| {
            let updated = diesel::update(subtasks::table.find(subtask_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if updated == 0 {
                return Err(BoardRepositoryError::SubtaskNotFound(subtask_id));
            }
            Ok(())
        })
        .await
    }

    async fn update_subtask_and_task(
        &self,
        subtask: &Subtask,
        task: &Task,
    ) -> BoardRepositoryResult<()> {
        let subtask_id = subtask.id();
        let task_id = task.id();
        let subtask_row = to_subtask_row(subtask);
        let task_row = to_task_row(task);

        self.run_blocking(move |connection| {
            connection.transaction(|txn| {
                let subtasks_updated =
                    diesel::update(subtasks::table.find(subtask_id.into_inner()))
                        .set(&subtask_row)
                        .execute(txn)
                        .map_err(BoardRepositoryError::persistence)?;
                if subtasks_updated == 0 {
                    return Err(BoardRepositoryError::SubtaskNotFound(subtask_id));
                }
                let tasks_updated = diesel::update(tasks::table.find(task_id.into_inner()))
                    .set(&task_row)
                    .execute(txn)
                    .map_err(BoardRepositoryError::persistence)?;
                if tasks_updated == 0 {
                    return Err(BoardRepositoryError::TaskNotFound(task_id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(subtasks::table.find(id.into_inner()))
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(BoardRepositoryError::SubtaskNotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<Option<Subtask>> {
        self.run_blocking(move |connection| {
            let row = subtasks::table
                .find(id.into_inner())
                .select(SubtaskRow::as_select())
                .first::<SubtaskRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(row_to_subtask).transpose()
        })
        .await
    }

    async fn subtasks_of_task(&self, id: TaskId) -> BoardRepositoryResult<Vec<Subtask>> {
        self.run_blocking(move |connection| {
            let rows = subtasks::table
                .filter(subtasks::task_id.eq(id.into_inner()))
                .select(SubtaskRow::as_select())
                .load::<SubtaskRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            rows.into_iter().map(row_to_subtask).collect()
        })
        .await
    }

    async fn insert_activity(&self, activity: &Activity) -> BoardRepositoryResult<()> {
        let row = to_activity_row(activity);
        self.run_blocking(move |connection| {
            diesel::insert_into(activities::table)
                .values(&row)
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_activity(&self, id: ActivityId) -> BoardRepositoryResult<Option<Activity>> {
        self.run_blocking(move |connection| {
            let row = activities::table
                .find(id.into_inner())
                .select(ActivityRow::as_select())
                .first::<ActivityRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            Ok(row.map(row_to_activity))
        })
        .await
    }

    async fn update_activity(&self, activity: &Activity) -> BoardRepositoryResult<()> {
        let activity_id = activity.id();
        let row = to_activity_row(activity);

        self.run_blocking(move |connection| {
            let updated = diesel::update(activities::table.find(activity_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            if updated == 0 {
                return Err(BoardRepositoryError::ActivityNotFound(activity_id));
            }
            Ok(())
        })
        .await
    }

    async fn activities_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Activity>> {
        self.run_blocking(move |connection| {
            let rows = activities::table
                .filter(activities::project_id.eq(id.into_inner()))
                .order(activities::created_at.desc())
                .select(ActivityRow::as_select())
                .load::<ActivityRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(rows.into_iter().map(row_to_activity).collect())
        })
        .await
    }

    async fn insert_watcher(&self, watcher: &Watcher) -> BoardRepositoryResult<()> {
        let row = to_watcher_row(watcher);
        self.run_blocking(move |connection| {
            diesel::insert_into(watchers::table)
                .values(&row)
                .on_conflict((watchers::project_id, watchers::user_id))
                .do_nothing()
                .execute(connection)
                .map_err(BoardRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn watchers_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Watcher>> {
        self.run_blocking(move |connection| {
            let rows = watchers::table
                .filter(watchers::project_id.eq(id.into_inner()))
                .select(WatcherRow::as_select())
                .load::<WatcherRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            rows.into_iter().map(row_to_watcher).collect()
        })
        .await
    }
}

fn to_project_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        name: project.name().as_str().to_owned(),
        visibility: project.visibility().as_str().to_owned(),
        start_date: project.start_date(),
        end_date: project.end_date(),
        completed_at: project.completed_at(),
        archived_at: project.archived_at(),
        approval: project.approval().as_str().to_owned(),
    }
}

fn row_to_project(row: ProjectRow) -> BoardRepositoryResult<Project> {
    let data = PersistedProjectData {
        id: ProjectId::from_uuid(row.id),
        name: Content::new(row.name).map_err(BoardRepositoryError::persistence)?,
        visibility: Visibility::try_from(row.visibility.as_str())
            .map_err(BoardRepositoryError::persistence)?,
        start_date: row.start_date,
        end_date: row.end_date,
        completed_at: row.completed_at,
        archived_at: row.archived_at,
        approval: Approval::try_from(row.approval.as_str())
            .map_err(BoardRepositoryError::persistence)?,
    };
    Ok(Project::from_persisted(data))
}

fn to_column_row(column: &Column) -> ColumnRow {
    ColumnRow {
        id: column.id().into_inner(),
        project_id: column.project_id().into_inner(),
        name: column.name().to_owned(),
        rank: column.rank(),
    }
}

fn row_to_column(row: ColumnRow) -> Column {
    Column::from_persisted(
        ColumnId::from_uuid(row.id),
        ProjectId::from_uuid(row.project_id),
        row.name,
        row.rank,
    )
}

fn to_task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        column_id: task.column_id().into_inner(),
        content: task.content().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        assignee: task.assignee().map(UserId::into_inner),
        due_date: task.due_date(),
        start_date: task.start_date(),
        completed_at: task.completed_at(),
        approval: task.approval().as_str().to_owned(),
    }
}

fn row_to_task(row: TaskRow) -> BoardRepositoryResult<Task> {
    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        column_id: ColumnId::from_uuid(row.column_id),
        content: Content::new(row.content).map_err(BoardRepositoryError::persistence)?,
        priority: Priority::try_from(row.priority.as_str())
            .map_err(BoardRepositoryError::persistence)?,
        assignee: row.assignee.map(UserId::from_uuid),
        due_date: row.due_date,
        start_date: row.start_date,
        completed_at: row.completed_at,
        approval: Approval::try_from(row.approval.as_str())
            .map_err(BoardRepositoryError::persistence)?,
    };
    Ok(Task::from_persisted(data))
}

fn to_subtask_row(subtask: &Subtask) -> SubtaskRow {
    SubtaskRow {
        id: subtask.id().into_inner(),
        task_id: subtask.task_id().into_inner(),
        content: subtask.content().as_str().to_owned(),
        assignee: subtask.assignee().map(UserId::into_inner),
        due_date: subtask.due_date(),
        completed_at: subtask.completed_at(),
        applicable: subtask.is_applicable(),
    }
}

fn row_to_subtask(row: SubtaskRow) -> BoardRepositoryResult<Subtask> {
    let data = PersistedSubtaskData {
        id: SubtaskId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        content: Content::new(row.content).map_err(BoardRepositoryError::persistence)?,
        assignee: row.assignee.map(UserId::from_uuid),
        due_date: row.due_date,
        completed_at: row.completed_at,
        applicable: row.applicable,
    };
    Ok(Subtask::from_persisted(data))
}

fn to_activity_row(activity: &Activity) -> ActivityRow {
    ActivityRow {
        id: activity.id().into_inner(),
        project_id: activity.project_id().into_inner(),
        task_id: activity.task_id().map(TaskId::into_inner),
        user_id: activity.user_id().into_inner(),
        comment: activity.comment().to_owned(),
        created_at: activity.created_at(),
        read_at: activity.read_at(),
    }
}

fn row_to_activity(row: ActivityRow) -> Activity {
    Activity::from_persisted(PersistedActivityData {
        id: ActivityId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        task_id: row.task_id.map(TaskId::from_uuid),
        user_id: UserId::from_uuid(row.user_id),
        comment: row.comment,
        created_at: row.created_at,
        read_at: row.read_at,
    })
}

fn to_watcher_row(watcher: &Watcher) -> WatcherRow {
    WatcherRow {
        project_id: watcher.project_id().into_inner(),
        user_id: watcher.user_id().into_inner(),
        email: watcher.email().as_str().to_owned(),
    }
}

fn row_to_watcher(row: WatcherRow) -> BoardRepositoryResult<Watcher> {
    let email = EmailAddress::new(row.email).map_err(BoardRepositoryError::persistence)?;
    Ok(Watcher::new(
        ProjectId::from_uuid(row.project_id),
        UserId::from_uuid(row.user_id),
        email,
    ))
}
