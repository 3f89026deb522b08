//! Activity recording service.

use crate::board::{
    domain::{Activity, ProjectId, TaskId, UserId},
    ports::{BoardRepository, BoardRepositoryResult},
};
use mockable::Clock;
use std::sync::Arc;

/// Appends immutable audit entries for user-visible mutations.
///
/// Every mutation that a user can observe produces exactly one entry;
/// idempotent re-derivations produce none. Entries are created unread with
/// the injected clock's current time.
#[derive(Clone)]
pub struct ActivityRecorder<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> ActivityRecorder<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new recorder.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Records one unread activity entry and returns it with its assigned
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the append fails; in that case no
    /// entry exists and nothing must be dispatched.
    pub async fn record(
        &self,
        project: ProjectId,
        actor: UserId,
        task: Option<TaskId>,
        comment: impl Into<String> + Send,
    ) -> BoardRepositoryResult<Activity> {
        let activity = Activity::record(project, actor, task, comment.into(), &*self.clock);
        self.repository.insert_activity(&activity).await?;
        Ok(activity)
    }
}
