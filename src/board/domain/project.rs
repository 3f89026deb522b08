//! Project aggregate root with visibility, timeline, and approval state.

use super::{Content, ParseApprovalError, ParseVisibilityError, ProjectId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Who may see a project inside its tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible only to the creating user.
    OnlyMe,
    /// Visible to assigned team members.
    Team,
    /// Visible to every user in the organization.
    Organization,
}

impl Visibility {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnlyMe => "only_me",
            Self::Team => "team",
            Self::Organization => "organization",
        }
    }
}

impl TryFrom<&str> for Visibility {
    type Error = ParseVisibilityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "only_me" => Ok(Self::OnlyMe),
            "team" => Ok(Self::Team),
            "organization" => Ok(Self::Organization),
            _ => Err(ParseVisibilityError(value.to_owned())),
        }
    }
}

/// Tri-state approval marker for completed work.
///
/// `Pending` doubles as the unset state: a freshly created or reverted record
/// has simply not been reviewed yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    /// Not yet reviewed.
    #[default]
    Pending,
    /// Reviewed and accepted.
    Approved,
    /// Reviewed and sent back for rework.
    Rejected,
}

impl Approval {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true when the marker is [`Approval::Approved`].
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl TryFrom<&str> for Approval {
    type Error = ParseApprovalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseApprovalError(value.to_owned())),
        }
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: Content,
    visibility: Visibility,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
    approval: Approval,
}

/// Parameter object for reconstructing a persisted project aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted project identifier.
    pub id: ProjectId,
    /// Persisted project name.
    pub name: Content,
    /// Persisted visibility.
    pub visibility: Visibility,
    /// Persisted timeline start, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// Persisted timeline end, if any.
    pub end_date: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted archival timestamp, if any.
    pub archived_at: Option<DateTime<Utc>>,
    /// Persisted approval marker.
    pub approval: Approval,
}

impl Project {
    /// Creates a new active project.
    #[must_use]
    pub fn new(name: Content, visibility: Visibility) -> Self {
        Self {
            id: ProjectId::new(),
            name,
            visibility,
            start_date: None,
            end_date: None,
            completed_at: None,
            archived_at: None,
            approval: Approval::Pending,
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            visibility: data.visibility,
            start_date: data.start_date,
            end_date: data.end_date,
            completed_at: data.completed_at,
            archived_at: data.archived_at,
            approval: data.approval,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &Content {
        &self.name
    }

    /// Returns the project visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns the timeline start, if set.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the timeline end, if set.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Returns the completion timestamp, if set.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the archival timestamp, if set.
    #[must_use]
    pub const fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Returns the approval marker.
    #[must_use]
    pub const fn approval(&self) -> Approval {
        self.approval
    }

    /// Sets the project timeline.
    pub const fn set_timeline(
        &mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) {
        self.start_date = start_date;
        self.end_date = end_date;
    }

    /// Marks the project as completed and awaiting approval.
    pub fn mark_completed(&mut self, clock: &impl Clock) {
        self.completed_at = Some(clock.utc());
        self.approval = Approval::Pending;
    }

    /// Reopens a completed project, clearing completion and approval.
    pub const fn reopen(&mut self) {
        self.completed_at = None;
        self.approval = Approval::Pending;
    }

    /// Marks the project as approved.
    pub const fn approve(&mut self) {
        self.approval = Approval::Approved;
    }

    /// Marks the project as rejected.
    pub const fn reject(&mut self) {
        self.approval = Approval::Rejected;
    }

    /// Soft-deletes the project.
    pub fn archive(&mut self, clock: &impl Clock) {
        self.archived_at = Some(clock.utc());
    }

    /// Returns true when the project has been soft-deleted.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Returns true when the project is completed and not archived.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some() && !self.is_archived()
    }

    /// Returns true when the timeline end has passed without completion.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.end_date
            .is_some_and(|end_date| end_date < now && !self.is_completed() && !self.is_archived())
    }
}
