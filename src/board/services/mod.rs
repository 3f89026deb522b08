//! Application services orchestrating the board core.
//!
//! - [`ActivityRecorder`] appends audit entries for user-visible mutations.
//! - [`NotificationDispatcher`] fans activity out to project watchers.
//! - [`MigrationEngine`] derives and applies column moves from subtask
//!   completion events.
//! - [`BoardService`] ties the above together behind the authorization gate.

mod activity;
mod board;
mod migration;
mod notification;

pub use activity::ActivityRecorder;
pub use board::{
    BoardService, BoardServiceError, BoardServiceResult, CreateProjectRequest, CreateSubtaskRequest,
    CreateTaskRequest, Mutated, SubtaskToggle, TransitionError, UpdateSubtaskRequest,
    UpdateTaskRequest,
};
pub use migration::{MigrationEngine, MigrationError, SubtaskEvent, TaskTransition, ToggleOutcome};
pub use notification::{DispatchFailure, DispatchReport, NotificationDispatcher};
