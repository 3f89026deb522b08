//! Unit tests for derived task status and the completion ratio.

use chrono::{Duration, Utc};
use mockable::{Clock, DefaultClock};
use rstest::rstest;

use crate::board::domain::{
    ColumnId, CompletionRatio, Content, Stage, Subtask, Task, TaskId,
};

fn content(text: &str) -> Content {
    Content::new(text).expect("content should be valid")
}

fn task() -> Task {
    Task::new(ColumnId::new(), content("Ship the release"))
}

fn ratio(completed: usize, applicable: usize) -> CompletionRatio {
    CompletionRatio::from_counts(completed, applicable)
}

#[test]
fn ratio_excludes_not_applicable_subtasks() {
    let parent = TaskId::new();
    let mut done = Subtask::new(parent, content("write changelog"));
    done.mark_completed(&DefaultClock);
    let mut waived = Subtask::new(parent, content("legacy migration"));
    waived.mark_completed(&DefaultClock);
    waived.set_applicable(false);
    let open = Subtask::new(parent, content("tag release"));

    let computed = CompletionRatio::of(&[done, waived, open]);
    assert_eq!(computed.completed(), 1);
    assert_eq!(computed.applicable(), 2);
    assert!(!computed.is_full());
}

#[test]
fn ratio_is_vacuously_full_without_applicable_subtasks() {
    assert!(ratio(0, 0).is_full());
    assert!(ratio(0, 0).none_complete());
    assert!(CompletionRatio::of(&[]).is_full());
}

#[test]
fn fresh_task_derives_pending() {
    let now = DefaultClock.utc();
    assert_eq!(task().derived_status(ratio(0, 3), now), Stage::Pending);
}

#[test]
fn partial_completion_derives_in_progress() {
    let now = DefaultClock.utc();
    assert_eq!(task().derived_status(ratio(1, 3), now), Stage::InProgress);
}

#[test]
fn full_unapproved_completion_derives_review() {
    let now = DefaultClock.utc();
    let mut subject = task();
    subject.mark_completed(&DefaultClock);
    assert_eq!(subject.derived_status(ratio(3, 3), now), Stage::Review);
}

#[test]
fn approved_completion_derives_completed() {
    let now = DefaultClock.utc();
    let mut subject = task();
    subject.mark_completed(&DefaultClock);
    subject.mark_approved();
    assert_eq!(subject.derived_status(ratio(3, 3), now), Stage::Completed);
    assert!(subject.is_completed(ratio(3, 3)));
}

#[test]
fn overdue_incomplete_task_derives_delayed() {
    let now = Utc::now();
    let mut subject = task();
    subject.set_due_date(Some(now - Duration::days(1)));
    assert_eq!(subject.derived_status(ratio(1, 3), now), Stage::Delayed);
    assert!(subject.is_overdue(ratio(1, 3), now));
}

#[test]
fn completed_task_is_never_overdue() {
    let now = Utc::now();
    let mut subject = task();
    subject.set_due_date(Some(now - Duration::days(1)));
    subject.mark_completed(&DefaultClock);
    subject.mark_approved();
    assert!(!subject.is_overdue(ratio(2, 2), now));
    assert_eq!(subject.derived_status(ratio(2, 2), now), Stage::Completed);
}

#[rstest]
#[case(Stage::Pending, Stage::InProgress)]
#[case(Stage::InProgress, Stage::Review)]
#[case(Stage::Review, Stage::Completed)]
#[case(Stage::Completed, Stage::Delayed)]
fn stages_order_by_pipeline_position(#[case] earlier: Stage, #[case] later: Stage) {
    assert!(earlier < later);
}

#[test]
fn rejection_keeps_completion_timestamp() {
    let now = DefaultClock.utc();
    let mut subject = task();
    subject.mark_completed(&DefaultClock);
    subject.mark_rejected();
    assert!(subject.completed_at().is_some());
    assert_eq!(subject.derived_status(ratio(2, 2), now), Stage::Review);
}
