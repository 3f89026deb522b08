//! End-to-end tests for subtask-driven column migration.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::rstest;

use crate::board::{
    domain::{Approval, Stage, UserId},
    ports::BoardRepository,
    services::{MigrationEngine, SubtaskEvent},
};

use super::helpers::Harness;

#[tokio::test]
async fn single_subtask_round_trip_restores_the_original_column() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let subtask = harness.subtask(actor, &task, "only step").await;

    let toggled = harness
        .service
        .set_subtask_completion(actor, subtask.id(), true)
        .await
        .expect("completion should succeed");
    let transition = toggled.transition.expect("full completion must migrate");
    assert_eq!(transition.from, Stage::Pending);
    assert_eq!(transition.to, Stage::Review);

    let reverted = harness
        .service
        .set_subtask_completion(actor, subtask.id(), false)
        .await
        .expect("reversion should succeed");
    let transition = reverted.transition.expect("reversion must migrate");
    assert_eq!(transition.to, Stage::Pending);
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Pending);
}

#[rstest]
#[case([0, 1, 2])]
#[case([2, 0, 1])]
#[case([1, 2, 0])]
#[case([2, 1, 0])]
#[tokio::test]
async fn completing_all_subtasks_lands_in_review_in_any_order(#[case] order: [usize; 3]) {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let subtasks = [
        harness.subtask(actor, &task, "first step").await,
        harness.subtask(actor, &task, "second step").await,
        harness.subtask(actor, &task, "third step").await,
    ];

    for index in order {
        harness
            .service
            .set_subtask_completion(actor, subtasks[index].id(), true)
            .await
            .expect("completion should succeed");
    }
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);
}

#[tokio::test]
async fn not_applicable_subtasks_do_not_block_review() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let actionable = harness.subtask(actor, &task, "actionable step").await;
    let waived = harness.subtask(actor, &task, "waived step").await;

    harness
        .service
        .set_subtask_applicability(actor, waived.id(), false)
        .await
        .expect("applicability change should succeed")
        .expect("the flag should flip");

    harness
        .service
        .set_subtask_completion(actor, actionable.id(), true)
        .await
        .expect("completion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);
}

#[tokio::test]
async fn redundant_toggle_changes_and_records_nothing() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (project, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let subtask = harness.subtask(actor, &task, "only step").await;

    harness
        .service
        .set_subtask_completion(actor, subtask.id(), true)
        .await
        .expect("first toggle should succeed");
    let feed_before = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");

    let repeated = harness
        .service
        .set_subtask_completion(actor, subtask.id(), true)
        .await
        .expect("redundant toggle should not fail");
    assert!(repeated.transition.is_none());
    assert!(repeated.activity.is_none());
    assert_eq!(repeated.dispatch.sent, 0);

    let feed_after = harness
        .service
        .activity_feed(project.id())
        .await
        .expect("feed should load");
    assert_eq!(feed_before.len(), feed_after.len());
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);
}

#[tokio::test]
async fn completing_while_in_review_advances_and_approves() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let first = harness.subtask(actor, &task, "first step").await;
    let second = harness.subtask(actor, &task, "second step").await;

    harness
        .service
        .set_subtask_applicability(actor, second.id(), false)
        .await
        .expect("applicability change should succeed")
        .expect("the flag should flip");
    harness
        .service
        .set_subtask_completion(actor, first.id(), true)
        .await
        .expect("completion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);

    // Restoring applicability makes the ratio partial again; completing the
    // second subtask fills it while the task already sits in review.
    harness
        .service
        .set_subtask_applicability(actor, second.id(), true)
        .await
        .expect("applicability change should succeed")
        .expect("the flag should flip");
    let toggled = harness
        .service
        .set_subtask_completion(actor, second.id(), true)
        .await
        .expect("completion should succeed");
    let transition = toggled.transition.expect("review exit must migrate");
    assert_eq!(transition.to, Stage::Completed);
    assert_eq!(toggled.task.approval(), Approval::Approved);
}

#[tokio::test]
async fn reverting_a_completed_task_clears_completion_and_approval() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let subtasks = [
        harness.subtask(actor, &task, "first step").await,
        harness.subtask(actor, &task, "second step").await,
        harness.subtask(actor, &task, "third step").await,
    ];
    for subtask in &subtasks {
        harness
            .service
            .set_subtask_completion(actor, subtask.id(), true)
            .await
            .expect("completion should succeed");
    }
    harness
        .service
        .approve_task(actor, task.id())
        .await
        .expect("approval should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Completed);

    let reverted = harness
        .service
        .set_subtask_completion(actor, subtasks[1].id(), false)
        .await
        .expect("reversion should succeed");
    let transition = reverted.transition.expect("reversion must migrate");
    assert_eq!(transition.from, Stage::Completed);
    assert_eq!(transition.to, Stage::InProgress);
    assert_eq!(reverted.task.approval(), Approval::Pending);
    assert!(reverted.task.completed_at().is_none());
}

#[tokio::test]
async fn reverting_every_subtask_falls_back_to_pending() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let first = harness.subtask(actor, &task, "first step").await;
    let second = harness.subtask(actor, &task, "second step").await;

    harness
        .service
        .set_subtask_completion(actor, first.id(), true)
        .await
        .expect("completion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::InProgress);
    harness
        .service
        .set_subtask_completion(actor, second.id(), true)
        .await
        .expect("completion should succeed");

    harness
        .service
        .set_subtask_completion(actor, second.id(), false)
        .await
        .expect("reversion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::InProgress);
    harness
        .service
        .set_subtask_completion(actor, first.id(), false)
        .await
        .expect("reversion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Pending);
}

#[tokio::test]
async fn reevaluation_moves_a_task_without_applicable_subtasks_into_review() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;

    let moved = harness
        .service
        .reevaluate_task(actor, task.id())
        .await
        .expect("re-evaluation should succeed")
        .expect("a task with no applicable subtasks should advance");
    assert_eq!(moved.value.to, Stage::Review);
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);

    let stable = harness
        .service
        .reevaluate_task(actor, task.id())
        .await
        .expect("re-evaluation should succeed");
    assert!(stable.is_none());
}

#[tokio::test]
async fn deleting_the_last_open_subtask_migrates_on_reevaluation() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let done = harness.subtask(actor, &task, "done step").await;
    let open = harness.subtask(actor, &task, "open step").await;

    harness
        .service
        .set_subtask_completion(actor, done.id(), true)
        .await
        .expect("completion should succeed");
    harness
        .service
        .delete_subtask(actor, open.id())
        .await
        .expect("deletion should succeed");
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::InProgress);

    let moved = harness
        .service
        .reevaluate_task(actor, task.id())
        .await
        .expect("re-evaluation should succeed")
        .expect("the remaining subtask is complete, so the task advances");
    assert_eq!(moved.value.to, Stage::Review);
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_sibling_completions_settle_in_review_exactly_once() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let first = harness.subtask(actor, &task, "first step").await;
    let second = harness.subtask(actor, &task, "second step").await;

    let (left, right) = tokio::join!(
        harness
            .service
            .set_subtask_completion(actor, first.id(), true),
        harness
            .service
            .set_subtask_completion(actor, second.id(), true),
    );
    let left = left.expect("completion should succeed");
    let right = right.expect("completion should succeed");

    // Whichever toggle lands second sees a full ratio; the other sees a
    // partial one. The per-task lock rules out both observing the same
    // ratio, so exactly one of them enters review.
    let into_review = [&left, &right]
        .iter()
        .filter(|toggle| {
            toggle
                .transition
                .is_some_and(|transition| transition.to == Stage::Review)
        })
        .count();
    assert_eq!(into_review, 1);
    assert_eq!(harness.stage_of(&task, &layout).await, Stage::Review);

    for subtask in [first, second] {
        let stored = harness
            .repository
            .find_subtask(subtask.id())
            .await
            .expect("lookup should succeed")
            .expect("subtask should exist");
        assert!(stored.is_completed());
    }
}

#[tokio::test]
async fn lock_entries_are_evicted_once_a_migration_settles() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let subtask = harness.subtask(actor, &task, "only step").await;

    let engine = MigrationEngine::new(Arc::clone(&harness.repository), Arc::new(DefaultClock));
    engine
        .apply(subtask.id(), SubtaskEvent::Completed)
        .await
        .expect("completion should succeed");
    assert_eq!(engine.lock_entries().await, 0);

    engine
        .reevaluate(task.id())
        .await
        .expect("re-evaluation should succeed");
    assert_eq!(engine.lock_entries().await, 0);
}

#[tokio::test]
async fn toggling_one_subtask_leaves_siblings_untouched() {
    let harness = Harness::new();
    let actor = UserId::new();
    let (_, layout) = harness.project(actor).await;
    let task = harness.task(actor, &layout).await;
    let first = harness.subtask(actor, &task, "first step").await;
    let second = harness.subtask(actor, &task, "second step").await;

    harness
        .service
        .set_subtask_completion(actor, first.id(), true)
        .await
        .expect("completion should succeed");
    let sibling = harness
        .repository
        .find_subtask(second.id())
        .await
        .expect("lookup should succeed")
        .expect("sibling should exist");
    assert!(!sibling.is_completed());
    assert!(sibling.is_applicable());
}
