//! Authorization port gating every board mutation.

use crate::board::domain::{ProjectId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Mutations the authorization collaborator is asked to gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardAction {
    /// Project-level changes: completion, approval, archival, watchers.
    ManageProject,
    /// Creating a task in a column.
    CreateTask,
    /// Editing, assigning, or moving a task.
    EditTask,
    /// Hard-deleting a task or subtask.
    DeleteTask,
    /// Approving or rejecting a completed task.
    ApproveTask,
    /// Posting a comment on a task.
    CommentTask,
    /// Creating, editing, or assigning a subtask.
    EditSubtask,
    /// Toggling a subtask's completion flag.
    CompleteSubtask,
}

/// Authorization contract supplied by the surrounding application.
///
/// The core asks before applying any transition and refuses with an
/// `Unauthorized` condition when the answer is negative. Policy details
/// (roles, tenancy) stay on the other side of this port.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decides whether `actor` may perform `action` within `project`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] when the decision backend is unavailable.
    async fn can_mutate(
        &self,
        actor: UserId,
        project: ProjectId,
        action: BoardAction,
    ) -> Result<bool, AuthorizerError>;
}

/// Failure of the authorization backend itself, distinct from a denial.
#[derive(Debug, Clone, Error)]
#[error("authorization backend failure: {0}")]
pub struct AuthorizerError(Arc<dyn std::error::Error + Send + Sync>);

impl AuthorizerError {
    /// Wraps a backend error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
