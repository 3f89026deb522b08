//! Error types for board domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain board values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The email address is not deliverable.
    #[error("invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// The content text is empty after trimming.
    #[error("content must not be empty")]
    EmptyContent,

    /// The content text exceeds the persisted length limit.
    #[error("content length {0} exceeds the 255 character limit")]
    ContentTooLong(usize),

    /// A project board does not hold exactly the five canonical columns.
    #[error("expected five board columns, found {0}")]
    WrongColumnCount(usize),

    /// Column ranks are not contiguous integers.
    #[error("board column ranks must be contiguous")]
    NonContiguousColumnRanks,
}

/// Error returned while parsing pipeline stages from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pipeline stage: {0}")]
pub struct ParseStageError(pub String);

/// Error returned while parsing task priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing approval markers from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown approval state: {0}")]
pub struct ParseApprovalError(pub String);

/// Error returned while parsing project visibility from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown project visibility: {0}")]
pub struct ParseVisibilityError(pub String);
