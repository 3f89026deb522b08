//! Thread-safe in-memory board repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::board::{
    domain::{
        Activity, ActivityId, Column, ColumnId, Project, ProjectId, Subtask, SubtaskId, Task,
        TaskId, Watcher,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};

/// In-memory board repository backed by hash maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardRepository {
    state: Arc<RwLock<BoardState>>,
}

#[derive(Debug, Default)]
struct BoardState {
    projects: HashMap<ProjectId, Project>,
    columns: HashMap<ColumnId, Column>,
    tasks: HashMap<TaskId, Task>,
    subtasks: HashMap<SubtaskId, Subtask>,
    activities: HashMap<ActivityId, Activity>,
    watchers: Vec<Watcher>,
}

impl InMemoryBoardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BoardRepositoryResult<RwLockReadGuard<'_, BoardState>> {
        self.state.read().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> BoardRepositoryResult<RwLockWriteGuard<'_, BoardState>> {
        self.state.write().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn write_subtask(state: &mut BoardState, subtask: &Subtask) -> BoardRepositoryResult<()> {
    if !state.subtasks.contains_key(&subtask.id()) {
        return Err(BoardRepositoryError::SubtaskNotFound(subtask.id()));
    }
    state.subtasks.insert(subtask.id(), subtask.clone());
    Ok(())
}

fn write_task(state: &mut BoardState, task: &Task) -> BoardRepositoryResult<()> {
    if !state.tasks.contains_key(&task.id()) {
        return Err(BoardRepositoryError::TaskNotFound(task.id()));
    }
    state.tasks.insert(task.id(), task.clone());
    Ok(())
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn insert_project(
        &self,
        project: &Project,
        columns: &[Column],
    ) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.projects.contains_key(&project.id()) {
            return Err(BoardRepositoryError::DuplicateProject(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        for column in columns {
            state.columns.insert(column.id(), column.clone());
        }
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if !state.projects.contains_key(&project.id()) {
            return Err(BoardRepositoryError::ProjectNotFound(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn columns_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Column>> {
        let state = self.read()?;
        let mut columns: Vec<Column> = state
            .columns
            .values()
            .filter(|column| column.project_id() == id)
            .cloned()
            .collect();
        columns.sort_by_key(Column::rank);
        Ok(columns)
    }

    async fn find_column(&self, id: ColumnId) -> BoardRepositoryResult<Option<Column>> {
        Ok(self.read()?.columns.get(&id).cloned())
    }

    async fn insert_task(&self, task: &Task) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(BoardRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        write_task(&mut state, task)
    }

    async fn delete_task(&self, id: TaskId) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Err(BoardRepositoryError::TaskNotFound(id));
        }
        state.subtasks.retain(|_, subtask| subtask.task_id() != id);
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> BoardRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn insert_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.subtasks.contains_key(&subtask.id()) {
            return Err(BoardRepositoryError::DuplicateSubtask(subtask.id()));
        }
        state.subtasks.insert(subtask.id(), subtask.clone());
        Ok(())
    }

    async fn update_subtask(&self, subtask: &Subtask) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        write_subtask(&mut state, subtask)
    }

    async fn update_subtask_and_task(
        &self,
        subtask: &Subtask,
        task: &Task,
    ) -> BoardRepositoryResult<()> {
        // One write guard covers both records, so the pair is atomic with
        // respect to every other repository call.
        let mut state = self.write()?;
        if !state.subtasks.contains_key(&subtask.id()) {
            return Err(BoardRepositoryError::SubtaskNotFound(subtask.id()));
        }
        if !state.tasks.contains_key(&task.id()) {
            return Err(BoardRepositoryError::TaskNotFound(task.id()));
        }
        write_subtask(&mut state, subtask)?;
        write_task(&mut state, task)
    }

    async fn delete_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.subtasks.remove(&id).is_none() {
            return Err(BoardRepositoryError::SubtaskNotFound(id));
        }
        Ok(())
    }

    async fn find_subtask(&self, id: SubtaskId) -> BoardRepositoryResult<Option<Subtask>> {
        Ok(self.read()?.subtasks.get(&id).cloned())
    }

    async fn subtasks_of_task(&self, id: TaskId) -> BoardRepositoryResult<Vec<Subtask>> {
        Ok(self
            .read()?
            .subtasks
            .values()
            .filter(|subtask| subtask.task_id() == id)
            .cloned()
            .collect())
    }

    async fn insert_activity(&self, activity: &Activity) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        state.activities.insert(activity.id(), activity.clone());
        Ok(())
    }

    async fn find_activity(&self, id: ActivityId) -> BoardRepositoryResult<Option<Activity>> {
        let state = self.read()?;
        Ok(state.activities.get(&id).cloned())
    }

    async fn update_activity(&self, activity: &Activity) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .activities
            .get_mut(&activity.id())
            .ok_or(BoardRepositoryError::ActivityNotFound(activity.id()))?;
        *slot = activity.clone();
        Ok(())
    }

    async fn activities_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Activity>> {
        let state = self.read()?;
        let mut activities: Vec<Activity> = state
            .activities
            .values()
            .filter(|activity| activity.project_id() == id)
            .cloned()
            .collect();
        activities.sort_by_key(|activity| std::cmp::Reverse(activity.created_at()));
        Ok(activities)
    }

    async fn insert_watcher(&self, watcher: &Watcher) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        let already_watching = state.watchers.iter().any(|existing| {
            existing.project_id() == watcher.project_id()
                && existing.user_id() == watcher.user_id()
        });
        if !already_watching {
            state.watchers.push(watcher.clone());
        }
        Ok(())
    }

    async fn watchers_of_project(&self, id: ProjectId) -> BoardRepositoryResult<Vec<Watcher>> {
        Ok(self
            .read()?
            .watchers
            .iter()
            .filter(|watcher| watcher.project_id() == id)
            .cloned()
            .collect())
    }
}
