//! Outbound mail gateway port for watcher notifications.

use crate::board::domain::{Activity, ActivityId, EmailAddress, ProjectId, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Template selector understood by the external mail renderer.
///
/// The core picks the key; template lookup and rendering happen on the other
/// side of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTemplate {
    /// Activity on a specific task.
    TaskActivity,
    /// Project-level activity.
    ProjectActivity,
}

impl MailTemplate {
    /// Returns the canonical template key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskActivity => "task_activity",
            Self::ProjectActivity => "project_activity",
        }
    }
}

/// Payload handed to the mail renderer alongside the template key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailPayload {
    /// The activity entry being announced.
    pub activity_id: ActivityId,
    /// Project the activity belongs to.
    pub project_id: ProjectId,
    /// Task the activity refers to, if any.
    pub task_id: Option<TaskId>,
    /// Human-readable activity comment.
    pub comment: String,
    /// When the activity was recorded.
    pub created_at: DateTime<Utc>,
}

impl MailPayload {
    /// Builds a payload from a recorded activity entry.
    #[must_use]
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            activity_id: activity.id(),
            project_id: activity.project_id(),
            task_id: activity.task_id(),
            comment: activity.comment().to_owned(),
            created_at: activity.created_at(),
        }
    }
}

/// Mail delivery contract.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Sends one message to one recipient.
    ///
    /// # Errors
    ///
    /// Returns [`MailGatewayError`] when the message cannot be delivered.
    /// Callers treat failures as best-effort: one recipient failing never
    /// aborts the remaining fan-out.
    async fn send(
        &self,
        recipient: &EmailAddress,
        template: MailTemplate,
        payload: &MailPayload,
    ) -> Result<(), MailGatewayError>;
}

/// Errors returned by mail gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum MailGatewayError {
    /// The gateway rejected the message for this recipient.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// The underlying transport failed.
    #[error("mail transport failure: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl MailGatewayError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
