//! Board columns and the project-relative stage layout.

use super::{BoardDomainError, ColumnId, ParseStageError, ProjectId};
use serde::{Deserialize, Serialize};

/// Pipeline stage of the fixed five-column kanban board.
///
/// A stage is identified by its rank offset from the project's lowest column
/// rank, never by a stored column identifier. Ordering follows the pipeline
/// sequence, so `Stage::Pending < Stage::Review` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No applicable subtask has been completed yet.
    Pending,
    /// Work is underway.
    InProgress,
    /// All applicable subtasks are complete; awaiting approval.
    Review,
    /// Approved and complete.
    Completed,
    /// Past its due date without completion.
    Delayed,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Review,
        Self::Completed,
        Self::Delayed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
        }
    }

    /// Returns the display name given to the canonical column at this stage.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Review => "Review",
            Self::Completed => "Completed",
            Self::Delayed => "Delayed",
        }
    }

    /// Returns the rank offset of this stage from the project minimum rank.
    #[must_use]
    pub const fn offset(self) -> i32 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Review => 2,
            Self::Completed => 3,
            Self::Delayed => 4,
        }
    }

    /// Resolves a stage from its rank offset.
    #[must_use]
    pub const fn from_offset(offset: i32) -> Option<Self> {
        match offset {
            0 => Some(Self::Pending),
            1 => Some(Self::InProgress),
            2 => Some(Self::Review),
            3 => Some(Self::Completed),
            4 => Some(Self::Delayed),
            _ => None,
        }
    }
}

impl TryFrom<&str> for Stage {
    type Error = ParseStageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            "delayed" => Ok(Self::Delayed),
            _ => Err(ParseStageError(value.to_owned())),
        }
    }
}

/// A named, ranked column owned by a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    project_id: ProjectId,
    name: String,
    rank: i32,
}

impl Column {
    /// Creates a new column with a fresh identifier.
    #[must_use]
    pub fn new(project_id: ProjectId, name: impl Into<String>, rank: i32) -> Self {
        Self {
            id: ColumnId::new(),
            project_id,
            name: name.into(),
            rank,
        }
    }

    /// Reconstructs a column from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: ColumnId,
        project_id: ProjectId,
        name: String,
        rank: i32,
    ) -> Self {
        Self {
            id,
            project_id,
            name,
            rank,
        }
    }

    /// Creates the five canonical columns for a newly created project.
    ///
    /// Ranks start at zero; stage identity remains offset-based, so boards
    /// whose ranks were persisted with a different base still resolve.
    #[must_use]
    pub fn canonical_board(project_id: ProjectId) -> Vec<Self> {
        Stage::ALL
            .iter()
            .map(|stage| Self::new(project_id, stage.column_name(), stage.offset()))
            .collect()
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> ColumnId {
        self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rank within the project, unique per project.
    #[must_use]
    pub const fn rank(&self) -> i32 {
        self.rank
    }
}

/// Resolved stage layout of one project board.
///
/// Maps each [`Stage`] to the concrete column occupying its rank offset.
/// Construction validates the board invariant: exactly five columns with
/// contiguous ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pending: ColumnId,
    in_progress: ColumnId,
    review: ColumnId,
    completed: ColumnId,
    delayed: ColumnId,
}

impl BoardLayout {
    /// Resolves the layout from a project's columns, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::WrongColumnCount`] unless exactly five
    /// columns are given, or [`BoardDomainError::NonContiguousColumnRanks`]
    /// when their ranks leave gaps.
    pub fn from_columns(columns: &[Column]) -> Result<Self, BoardDomainError> {
        let mut sorted: Vec<&Column> = columns.iter().collect();
        sorted.sort_by_key(|column| column.rank());

        let min_rank = sorted
            .first()
            .map(|column| column.rank())
            .ok_or(BoardDomainError::WrongColumnCount(0))?;
        for (offset, column) in (0_i32..).zip(&sorted) {
            if column.rank() != min_rank + offset {
                return Err(BoardDomainError::NonContiguousColumnRanks);
            }
        }

        match sorted.as_slice() {
            [pending, in_progress, review, completed, delayed] => Ok(Self {
                pending: pending.id(),
                in_progress: in_progress.id(),
                review: review.id(),
                completed: completed.id(),
                delayed: delayed.id(),
            }),
            _ => Err(BoardDomainError::WrongColumnCount(columns.len())),
        }
    }

    /// Returns the column occupying the given stage.
    #[must_use]
    pub const fn column_for(&self, stage: Stage) -> ColumnId {
        match stage {
            Stage::Pending => self.pending,
            Stage::InProgress => self.in_progress,
            Stage::Review => self.review,
            Stage::Completed => self.completed,
            Stage::Delayed => self.delayed,
        }
    }

    /// Returns the stage a column occupies, or `None` for a foreign column.
    #[must_use]
    pub fn stage_for(&self, column: ColumnId) -> Option<Stage> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| self.column_for(*stage) == column)
    }
}
