//! Column-migration engine driven by subtask completion events.
//!
//! The engine is the single authority for automatic column moves. It derives
//! the parent task's target stage from its completion ratio, applies the
//! move together with completion and approval bookkeeping, and persists the
//! subtask toggle and the task move in one transaction.

use crate::board::{
    domain::{
        Approval, BoardDomainError, BoardLayout, ColumnId, CompletionRatio, Stage, Subtask,
        SubtaskId, Task, TaskId,
    },
    ports::{BoardRepository, BoardRepositoryError},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Subtask completion event driving one migration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskEvent {
    /// The subtask's completion flag flipped from incomplete to complete.
    Completed,
    /// The subtask's completion flag flipped from complete to incomplete.
    Reverted,
}

/// A column move applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTransition {
    /// The migrated task.
    pub task: TaskId,
    /// Stage the task occupied before the move.
    pub from: Stage,
    /// Stage the task occupies after the move.
    pub to: Stage,
}

/// Result of applying one subtask toggle.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    /// The subtask after the toggle.
    pub subtask: Subtask,
    /// The parent task after any migration.
    pub task: Task,
    /// The column move, if one was applied.
    pub transition: Option<TaskTransition>,
    /// Whether the completion flag actually flipped. A redundant toggle
    /// leaves everything untouched and persists nothing.
    pub changed: bool,
}

/// Errors returned by the migration engine.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The parent task could not be resolved.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The toggled subtask could not be resolved.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),

    /// The task's column could not be resolved within its project board.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The project board violates the five-column invariant.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] BoardRepositoryError),
}

/// Field changes applied alongside a column move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepEffect {
    /// Column move only.
    Move,
    /// Set the completion timestamp and reset approval to pending.
    EnterReview,
    /// Mark the task approved.
    Approve,
    /// Clear the completion timestamp and reset approval to pending.
    ClearCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MigrationStep {
    target: Stage,
    effect: StepEffect,
}

/// Rule set for a subtask flipping to complete, first match wins.
fn plan_completed(
    current: Stage,
    ratio: CompletionRatio,
    approval: Approval,
) -> Option<MigrationStep> {
    if !ratio.is_full() {
        return (current != Stage::InProgress).then_some(MigrationStep {
            target: Stage::InProgress,
            effect: StepEffect::Move,
        });
    }
    if current < Stage::Review {
        return Some(MigrationStep {
            target: Stage::Review,
            effect: StepEffect::EnterReview,
        });
    }
    if !approval.is_approved() {
        return Some(MigrationStep {
            target: Stage::Completed,
            effect: StepEffect::Approve,
        });
    }
    None
}

/// Rule set for a subtask flipping back to incomplete.
///
/// A task leaving review or completion always falls back to in-progress with
/// its completion and approval cleared; when the reversion leaves no
/// applicable subtask complete, it falls all the way back to pending. Both
/// rules together make a single-subtask complete/un-complete cycle restore
/// the original column.
fn plan_reverted(current: Stage, ratio: CompletionRatio) -> Option<MigrationStep> {
    let leaves_review = matches!(current, Stage::Review | Stage::Completed);
    let target = if ratio.none_complete() {
        Stage::Pending
    } else if leaves_review {
        Stage::InProgress
    } else {
        current
    };
    if target == current && !leaves_review {
        return None;
    }
    Some(MigrationStep {
        target,
        effect: if leaves_review {
            StepEffect::ClearCompletion
        } else {
            StepEffect::Move
        },
    })
}

/// Rule set for an explicit re-evaluation with no subtask event.
///
/// Re-evaluation only ever advances: a task whose applicable subtasks are all
/// complete (vacuously, a task with none) is moved into review, and a pending
/// task with partial completion is reconciled to in-progress. Demotions are
/// reserved for reversion events, so re-invoking the engine on a stable task
/// is a no-op.
fn plan_reevaluation(current: Stage, ratio: CompletionRatio) -> Option<MigrationStep> {
    if ratio.is_full() {
        return (current < Stage::Review).then_some(MigrationStep {
            target: Stage::Review,
            effect: StepEffect::EnterReview,
        });
    }
    if !ratio.none_complete() && current == Stage::Pending {
        return Some(MigrationStep {
            target: Stage::InProgress,
            effect: StepEffect::Move,
        });
    }
    None
}

fn apply_step(task: &mut Task, layout: &BoardLayout, step: MigrationStep, clock: &impl Clock) {
    task.move_to_column(layout.column_for(step.target));
    match step.effect {
        StepEffect::Move => {}
        StepEffect::EnterReview => task.mark_completed(clock),
        StepEffect::Approve => task.mark_approved(),
        StepEffect::ClearCompletion => task.mark_incomplete(),
    }
}

struct TaskContext {
    task: Task,
    layout: BoardLayout,
    current: Stage,
}

/// Applies subtask completion events to parent tasks.
///
/// Mutations to one task are serialised behind a per-task async mutex, so
/// the read-recompute-write window for the completion ratio and the column
/// assignment is atomic relative to concurrent toggles on sibling subtasks.
/// Tasks never share a lock, so distinct tasks migrate independently.
#[derive(Clone)]
pub struct MigrationEngine<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    locks: Arc<Mutex<HashMap<TaskId, Arc<Mutex<()>>>>>,
}

impl<R, C> MigrationEngine<R, C>
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new engine.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_task(&self, task: TaskId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(task).or_default())
        };
        lock.lock_owned().await
    }

    /// Evicts the task's lock entry once no other holder remains, so the
    /// map does not accumulate an entry per task ever touched.
    async fn release_task(&self, task: TaskId) {
        let mut locks = self.locks.lock().await;
        let unshared = locks
            .get(&task)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unshared {
            locks.remove(&task);
        }
    }

    #[cfg(test)]
    pub(crate) async fn lock_entries(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn load_context(&self, task_id: TaskId) -> Result<TaskContext, MigrationError> {
        let task = self
            .repository
            .find_task(task_id)
            .await?
            .ok_or(MigrationError::TaskNotFound(task_id))?;
        let column = self
            .repository
            .find_column(task.column_id())
            .await?
            .ok_or(MigrationError::ColumnNotFound(task.column_id()))?;
        let columns = self.repository.columns_of_project(column.project_id()).await?;
        let layout = BoardLayout::from_columns(&columns)?;
        let current = layout
            .stage_for(task.column_id())
            .ok_or(MigrationError::ColumnNotFound(task.column_id()))?;
        Ok(TaskContext {
            task,
            layout,
            current,
        })
    }

    /// Applies one subtask toggle and migrates the parent task.
    ///
    /// The toggle and any resulting column move are persisted in a single
    /// transaction; when either record cannot be resolved the operation
    /// fails with no partial mutation. A redundant toggle (the flag is
    /// already in the requested state) changes and persists nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the subtask, parent task, or board
    /// layout cannot be resolved, or when persistence fails.
    pub async fn apply(
        &self,
        subtask_id: SubtaskId,
        event: SubtaskEvent,
    ) -> Result<ToggleOutcome, MigrationError> {
        let located = self
            .repository
            .find_subtask(subtask_id)
            .await?
            .ok_or(MigrationError::SubtaskNotFound(subtask_id))?;
        let task_id = located.task_id();
        let guard = self.lock_task(task_id).await;
        let outcome = self.apply_locked(subtask_id, event).await;
        drop(guard);
        self.release_task(task_id).await;
        outcome
    }

    async fn apply_locked(
        &self,
        subtask_id: SubtaskId,
        event: SubtaskEvent,
    ) -> Result<ToggleOutcome, MigrationError> {
        // Reload under the lock; the records may have changed while waiting.
        let mut subtask = self
            .repository
            .find_subtask(subtask_id)
            .await?
            .ok_or(MigrationError::SubtaskNotFound(subtask_id))?;
        let mut context = self.load_context(subtask.task_id()).await?;

        let changed = match event {
            SubtaskEvent::Completed => subtask.mark_completed(&*self.clock),
            SubtaskEvent::Reverted => subtask.mark_incomplete(),
        };
        if !changed {
            return Ok(ToggleOutcome {
                subtask,
                task: context.task,
                transition: None,
                changed: false,
            });
        }

        let mut siblings = self.repository.subtasks_of_task(subtask.task_id()).await?;
        if let Some(slot) = siblings
            .iter_mut()
            .find(|sibling| sibling.id() == subtask.id())
        {
            *slot = subtask.clone();
        }
        let ratio = CompletionRatio::of(&siblings);

        let planned = match event {
            SubtaskEvent::Completed => {
                plan_completed(context.current, ratio, context.task.approval())
            }
            SubtaskEvent::Reverted => plan_reverted(context.current, ratio),
        };
        let transition = planned.map(|step| {
            apply_step(&mut context.task, &context.layout, step, &*self.clock);
            TaskTransition {
                task: context.task.id(),
                from: context.current,
                to: step.target,
            }
        });

        if transition.is_some() {
            self.repository
                .update_subtask_and_task(&subtask, &context.task)
                .await?;
        } else {
            self.repository.update_subtask(&subtask).await?;
        }

        Ok(ToggleOutcome {
            subtask,
            task: context.task,
            transition,
            changed: true,
        })
    }

    /// Re-derives a task's stage with no subtask event.
    ///
    /// Lets a task whose applicable subtasks are already all complete (in
    /// particular one with zero applicable subtasks) advance into review
    /// without waiting for a toggle. Returns `None` for a stable task, and
    /// persists nothing in that case.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the task or board layout cannot be
    /// resolved, or when persistence fails.
    pub async fn reevaluate(
        &self,
        task_id: TaskId,
    ) -> Result<Option<TaskTransition>, MigrationError> {
        let guard = self.lock_task(task_id).await;
        let transition = self.reevaluate_locked(task_id).await;
        drop(guard);
        self.release_task(task_id).await;
        transition
    }

    async fn reevaluate_locked(
        &self,
        task_id: TaskId,
    ) -> Result<Option<TaskTransition>, MigrationError> {
        let mut context = self.load_context(task_id).await?;
        let subtasks = self.repository.subtasks_of_task(task_id).await?;
        let ratio = CompletionRatio::of(&subtasks);

        let Some(step) = plan_reevaluation(context.current, ratio) else {
            return Ok(None);
        };
        apply_step(&mut context.task, &context.layout, step, &*self.clock);
        self.repository.update_task(&context.task).await?;
        Ok(Some(TaskTransition {
            task: context.task.id(),
            from: context.current,
            to: step.target,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{StepEffect, plan_completed, plan_reevaluation, plan_reverted};
    use crate::board::domain::{Approval, CompletionRatio, Stage};

    fn ratio(completed: usize, applicable: usize) -> CompletionRatio {
        CompletionRatio::from_counts(completed, applicable)
    }

    #[test]
    fn partial_completion_targets_in_progress() {
        let step = plan_completed(Stage::Pending, ratio(1, 3), Approval::Pending)
            .expect("pending task with partial completion must move");
        assert_eq!(step.target, Stage::InProgress);
        assert_eq!(step.effect, StepEffect::Move);
    }

    #[test]
    fn partial_completion_in_progress_is_noop() {
        assert!(plan_completed(Stage::InProgress, ratio(2, 3), Approval::Pending).is_none());
    }

    #[test]
    fn full_completion_enters_review() {
        let step = plan_completed(Stage::InProgress, ratio(3, 3), Approval::Pending)
            .expect("fully complete task must enter review");
        assert_eq!(step.target, Stage::Review);
        assert_eq!(step.effect, StepEffect::EnterReview);
    }

    #[test]
    fn full_completion_in_review_advances_to_completed() {
        let step = plan_completed(Stage::Review, ratio(3, 3), Approval::Pending)
            .expect("unapproved task in review must advance");
        assert_eq!(step.target, Stage::Completed);
        assert_eq!(step.effect, StepEffect::Approve);
    }

    #[test]
    fn approved_completed_task_is_stable() {
        assert!(plan_completed(Stage::Completed, ratio(3, 3), Approval::Approved).is_none());
    }

    #[test]
    fn reversion_from_review_clears_and_falls_back() {
        let step = plan_reverted(Stage::Review, ratio(2, 3))
            .expect("reverted task must leave review");
        assert_eq!(step.target, Stage::InProgress);
        assert_eq!(step.effect, StepEffect::ClearCompletion);
    }

    #[test]
    fn reversion_to_zero_complete_falls_back_to_pending() {
        let step = plan_reverted(Stage::Review, ratio(0, 1))
            .expect("single-subtask reversion must fall back");
        assert_eq!(step.target, Stage::Pending);
        assert_eq!(step.effect, StepEffect::ClearCompletion);
    }

    #[test]
    fn reversion_in_pending_is_noop() {
        assert!(plan_reverted(Stage::Pending, ratio(0, 2)).is_none());
    }

    #[test]
    fn reevaluation_moves_vacuously_complete_task_to_review() {
        let step = plan_reevaluation(Stage::Pending, ratio(0, 0))
            .expect("zero-subtask task must be eligible for review");
        assert_eq!(step.target, Stage::Review);
        assert_eq!(step.effect, StepEffect::EnterReview);
    }

    #[test]
    fn reevaluation_never_demotes() {
        assert!(plan_reevaluation(Stage::Review, ratio(1, 2)).is_none());
        assert!(plan_reevaluation(Stage::InProgress, ratio(1, 2)).is_none());
        assert!(plan_reevaluation(Stage::Completed, ratio(2, 2)).is_none());
    }
}
