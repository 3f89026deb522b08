//! Watcher subscriptions linking users to project activity.

use super::{EmailAddress, ProjectId, UserId};
use serde::{Deserialize, Serialize};

/// Subscription of a user to a project's notifiable events.
///
/// Created explicitly, for example when a team member is assigned, and
/// consulted by the notification fan-out on every notifiable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watcher {
    project_id: ProjectId,
    user_id: UserId,
    email: EmailAddress,
}

impl Watcher {
    /// Creates a new watcher subscription.
    #[must_use]
    pub const fn new(project_id: ProjectId, user_id: UserId, email: EmailAddress) -> Self {
        Self {
            project_id,
            user_id,
            email,
        }
    }

    /// Returns the watched project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the subscribed user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the delivery address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }
}
