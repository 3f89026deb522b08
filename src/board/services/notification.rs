//! Watcher notification fan-out service.

use crate::board::{
    domain::{Activity, EmailAddress, ProjectId},
    ports::{
        BoardRepository, BoardRepositoryResult, MailGateway, MailGatewayError, MailPayload,
        MailTemplate,
    },
};
use std::collections::HashSet;
use std::sync::Arc;

/// One failed delivery attempt within a fan-out.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    /// Address the delivery was attempted to.
    pub recipient: EmailAddress,
    /// Gateway error for this recipient.
    pub error: MailGatewayError,
}

/// Outcome of one watcher fan-out.
///
/// Failures are collected for observability, never raised to the caller of
/// the triggering mutation: the state change stays authoritative regardless
/// of delivery.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Number of messages handed to the gateway successfully.
    pub sent: usize,
    /// Deliveries that failed, one entry per recipient.
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    /// Returns true when every attempted delivery succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fans one activity entry out to the watchers of a project.
#[derive(Clone)]
pub struct NotificationDispatcher<R, M>
where
    R: BoardRepository,
    M: MailGateway,
{
    repository: Arc<R>,
    mail: Arc<M>,
}

impl<R, M> NotificationDispatcher<R, M>
where
    R: BoardRepository,
    M: MailGateway,
{
    /// Creates a new dispatcher.
    #[must_use]
    pub const fn new(repository: Arc<R>, mail: Arc<M>) -> Self {
        Self { repository, mail }
    }

    /// Sends one message per distinct watcher of `project`.
    ///
    /// Watchers are de-duplicated by user, so no watcher receives the same
    /// activity twice. Zero watchers means zero sends and no error. Delivery
    /// failures are logged, collected into the report, and never abort the
    /// remaining fan-out.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the watcher list cannot be loaded;
    /// gateway failures are reported, not returned.
    pub async fn notify(
        &self,
        project: ProjectId,
        activity: &Activity,
    ) -> BoardRepositoryResult<DispatchReport> {
        let watchers = self.repository.watchers_of_project(project).await?;
        let template = if activity.task_id().is_some() {
            MailTemplate::TaskActivity
        } else {
            MailTemplate::ProjectActivity
        };
        let payload = MailPayload::from_activity(activity);

        let mut notified = HashSet::new();
        let mut report = DispatchReport::default();
        for watcher in watchers {
            if !notified.insert(watcher.user_id()) {
                continue;
            }
            match self.mail.send(watcher.email(), template, &payload).await {
                Ok(()) => report.sent += 1,
                Err(error) => {
                    tracing::warn!(
                        recipient = %watcher.email(),
                        activity = %activity.id(),
                        %error,
                        "watcher notification delivery failed",
                    );
                    report.failures.push(DispatchFailure {
                        recipient: watcher.email().clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}
